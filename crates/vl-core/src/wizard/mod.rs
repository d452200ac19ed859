//! Wizard domain module.
//!
//! This module defines the bridge-pairing wizard state machine types.

pub mod state_machine;

pub use state_machine::{
    AbortReason, FormError, WizardAction, WizardEvent, WizardState, WizardStateMachine,
};
