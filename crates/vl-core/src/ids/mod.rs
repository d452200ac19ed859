//! ID type wrappers for type safety.

pub mod bridge_uuid;
pub mod local_uuid;

mod id_macro;

pub use bridge_uuid::BridgeUuid;
pub use local_uuid::LocalUuid;
