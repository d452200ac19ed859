use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Locally generated identifier representing this controller instance to a
/// bridge. Generated once per pairing and persisted with the record; the
/// bridge uses it to recognise the registered application on later sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalUuid(String);

impl_id!(LocalUuid);

impl LocalUuid {
    /// Generate a fresh identifier (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}
