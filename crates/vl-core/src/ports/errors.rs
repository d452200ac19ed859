use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairingStoreError {
    #[error("pairing record not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum AppDirsError {
    #[error("could not resolve the platform data directory")]
    Unresolved,
}
