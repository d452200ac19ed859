//! Registration PIN value type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest PIN a bridge accepts.
const MAX_PIN: u16 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("a PIN must be between 0000 and 9999")]
    Invalid,
}

/// A 4-digit registration PIN.
///
/// Bridges ship with the factory PIN `0000`; installers may change it from
/// the appliance front panel. Leading zeros are significant for display but
/// not for comparison, so the value is stored numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pin(u16);

impl Pin {
    /// Factory PIN used for the silent first registration attempt.
    pub const DEFAULT: Pin = Pin(0);

    pub fn new(value: u16) -> Result<Self, PinError> {
        if value > MAX_PIN {
            return Err(PinError::Invalid);
        }
        Ok(Self(value))
    }

    /// Coerce user input into a PIN. Accepts 1 to 4 ASCII digits,
    /// surrounding whitespace ignored.
    pub fn parse(input: &str) -> Result<Self, PinError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.len() > 4 {
            return Err(PinError::Invalid);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PinError::Invalid);
        }
        let value = trimmed.parse::<u16>().map_err(|_| PinError::Invalid)?;
        Self::new(value)
    }

    /// Parse an optional form field: an empty field means "no PIN supplied".
    pub fn parse_optional(input: &str) -> Result<Option<Self>, PinError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Self::parse(trimmed).map(Some)
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}
