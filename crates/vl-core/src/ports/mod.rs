//! Port interfaces for the application layer
//!
//! Ports define the contract between the application logic (use cases)
//! and infrastructure implementations. This follows Hexagonal Architecture
//! principles, allowing the core business logic to remain independent of
//! external dependencies.

pub mod app_dirs;
pub mod bridge_client;
pub mod errors;
pub mod pairing_store;
pub mod settings;
pub mod wizard_event;

pub use app_dirs::AppDirsPort;
pub use bridge_client::{BridgeClientError, BridgeClientPort};
pub use errors::{AppDirsError, PairingStoreError};
pub use pairing_store::PairingStorePort;
pub use settings::SettingsPort;
pub use wizard_event::WizardEventPort;
