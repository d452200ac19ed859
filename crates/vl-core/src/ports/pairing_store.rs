//! Persisted pairing record store port.

use async_trait::async_trait;

use crate::ids::BridgeUuid;
use crate::pairing::PairingRecord;
use crate::ports::errors::PairingStoreError;

#[async_trait]
pub trait PairingStorePort: Send + Sync {
    async fn get(&self, uuid: &BridgeUuid) -> Result<Option<PairingRecord>, PairingStoreError>;

    async fn list_all(&self) -> Result<Vec<PairingRecord>, PairingStoreError>;

    /// Insert or replace the record for its bridge uuid.
    async fn upsert(&self, record: PairingRecord) -> Result<(), PairingStoreError>;

    async fn delete(&self, uuid: &BridgeUuid) -> Result<(), PairingStoreError>;
}
