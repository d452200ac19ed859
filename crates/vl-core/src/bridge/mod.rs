//! Bridge domain model.

use serde::{Deserialize, Serialize};

use crate::ids::BridgeUuid;

/// A ventilation bridge as reported by LAN discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    /// Host address the bridge answered from.
    pub host: String,
    /// The bridge's own identifier.
    pub uuid: BridgeUuid,
}

impl Bridge {
    pub fn new(host: impl Into<String>, uuid: impl Into<BridgeUuid>) -> Self {
        Self {
            host: host.into(),
            uuid: uuid.into(),
        }
    }
}

impl std::fmt::Display for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.host, self.uuid)
    }
}
