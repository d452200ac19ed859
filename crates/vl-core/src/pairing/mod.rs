//! Pairing domain module.
//!
//! PIN handling and the persisted credential record.

pub mod pin;
pub mod record;

pub use pin::{Pin, PinError};
pub use record::PairingRecord;
