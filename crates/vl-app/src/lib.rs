//! VentLink Application Orchestration Layer
//!
//! This crate contains business logic use cases and runtime orchestration.

pub mod usecases;

pub use usecases::wizard::{WizardConfig, WizardOrchestrator, WizardOrchestratorError};
pub use usecases::{ForgetBridge, ListBridges};
