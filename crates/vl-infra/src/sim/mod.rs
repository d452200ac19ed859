//! In-process simulated bridge transport.
//!
//! Behaves like a small LAN of appliances so the wizard can be exercised
//! end-to-end without hardware. This is a stand-in transport for the demo
//! CLI and for integration tests, not a protocol implementation.

pub mod bridge;

pub use bridge::{SimulatedAppliance, SimulatedBridgeClient};
