//! Business logic use cases

pub mod forget_bridge;
pub mod list_bridges;
pub mod wizard;

pub use forget_bridge::ForgetBridge;
pub use list_bridges::ListBridges;
