//! # vl-core
//!
//! Core domain models and business logic for VentLink.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod app_dirs;
pub mod bridge;
pub mod ids;
pub mod pairing;
pub mod ports;
pub mod settings;
pub mod wizard;

// Re-export commonly used types at the crate root
pub use bridge::Bridge;
pub use ids::{BridgeUuid, LocalUuid};
pub use pairing::{PairingRecord, Pin, PinError};
pub use wizard::{AbortReason, FormError, WizardAction, WizardEvent, WizardState};
