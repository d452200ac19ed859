use std::sync::Arc;

use tracing::info;
use vl_core::ids::BridgeUuid;
use vl_core::ports::{PairingStoreError, PairingStorePort};

/// Use case for deleting a paired bridge's record.
///
/// The bridge itself keeps its registered-app slot; clearing that requires
/// the appliance front panel and is outside this hub's reach.
pub struct ForgetBridge {
    store: Arc<dyn PairingStorePort>,
}

impl ForgetBridge {
    pub fn new(store: Arc<dyn PairingStorePort>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, uuid: &BridgeUuid) -> Result<(), PairingStoreError> {
        self.store.delete(uuid).await?;
        info!(bridge_uuid = %uuid, "pairing record deleted");
        Ok(())
    }
}
