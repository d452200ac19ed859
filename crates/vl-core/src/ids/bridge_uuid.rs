use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifier a bridge reports about itself during discovery.
///
/// This is assigned by the appliance vendor and is stable across restarts,
/// unlike the host address, which follows DHCP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BridgeUuid(String);

impl_id!(BridgeUuid);
