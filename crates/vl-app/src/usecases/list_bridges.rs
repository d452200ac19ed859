use std::sync::Arc;

use vl_core::pairing::PairingRecord;
use vl_core::ports::{PairingStoreError, PairingStorePort};

/// Use case for listing the paired bridges, newest first.
pub struct ListBridges {
    store: Arc<dyn PairingStorePort>,
}

impl ListBridges {
    pub fn new(store: Arc<dyn PairingStorePort>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Result<Vec<PairingRecord>, PairingStoreError> {
        let mut records = self.store.list_all().await?;
        records.sort_by(|a, b| b.paired_at.cmp(&a.paired_at));
        Ok(records)
    }
}
