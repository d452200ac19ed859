//! File-based pairing record store.
//!
//! All records live in one JSON file in the application data directory. A
//! missing file reads as an empty store; writes go through a temp file and
//! rename so the file is never observed half-written.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use vl_core::ids::BridgeUuid;
use vl_core::pairing::PairingRecord;
use vl_core::ports::{PairingStoreError, PairingStorePort};

pub const DEFAULT_BRIDGES_FILE: &str = "bridges.json";

pub struct FilePairingStore {
    path: PathBuf,
}

impl FilePairingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default file name under a base directory.
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join(DEFAULT_BRIDGES_FILE),
        }
    }

    async fn ensure_parent_dir(&self) -> Result<(), PairingStoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PairingStoreError::Storage(format!("create store dir: {e}")))?;
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<PairingRecord>, PairingStoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(PairingStoreError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| PairingStoreError::Storage(format!("parse pairing records: {e}")))
    }

    async fn save_all(&self, records: &[PairingRecord]) -> Result<(), PairingStoreError> {
        self.ensure_parent_dir().await?;

        let content = serde_json::to_string_pretty(records)
            .map_err(|e| PairingStoreError::Storage(format!("serialize pairing records: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| PairingStoreError::Storage(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            PairingStoreError::Storage(format!(
                "rename {} -> {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), count = records.len(), "pairing records written");
        Ok(())
    }
}

#[async_trait]
impl PairingStorePort for FilePairingStore {
    async fn get(&self, uuid: &BridgeUuid) -> Result<Option<PairingRecord>, PairingStoreError> {
        let records = self.load_all().await?;
        Ok(records.into_iter().find(|r| &r.bridge_uuid == uuid))
    }

    async fn list_all(&self) -> Result<Vec<PairingRecord>, PairingStoreError> {
        self.load_all().await
    }

    async fn upsert(&self, record: PairingRecord) -> Result<(), PairingStoreError> {
        let mut records = self.load_all().await?;
        match records
            .iter_mut()
            .find(|r| r.bridge_uuid == record.bridge_uuid)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save_all(&records).await
    }

    async fn delete(&self, uuid: &BridgeUuid) -> Result<(), PairingStoreError> {
        let mut records = self.load_all().await?;
        let before = records.len();
        records.retain(|r| &r.bridge_uuid != uuid);
        if records.len() == before {
            return Err(PairingStoreError::NotFound);
        }
        self.save_all(&records).await
    }
}
