//! Persisted pairing credential record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bridge::Bridge;
use crate::ids::{BridgeUuid, LocalUuid};

/// The credential record written once a registration handshake succeeds.
///
/// The PIN is deliberately absent: it is only needed while registering and
/// is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub bridge_uuid: BridgeUuid,
    pub host: String,
    pub local_uuid: LocalUuid,
    /// Display name for the entry; defaults to the bridge host.
    pub name: String,
    pub paired_at: DateTime<Utc>,
}

impl PairingRecord {
    pub fn new(bridge: &Bridge, local_uuid: LocalUuid, paired_at: DateTime<Utc>) -> Self {
        Self {
            bridge_uuid: bridge.uuid.clone(),
            host: bridge.host.clone(),
            local_uuid,
            name: bridge.host.clone(),
            paired_at,
        }
    }
}
