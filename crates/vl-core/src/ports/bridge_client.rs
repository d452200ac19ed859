//! Bridge transport port.
//!
//! The LAN discovery protocol and the session/registration wire protocol are
//! owned by the transport implementation behind this trait; the wizard only
//! depends on the operations and the three failure modes below.

use async_trait::async_trait;
use thiserror::Error;

use crate::bridge::Bridge;
use crate::ids::LocalUuid;
use crate::pairing::Pin;

#[derive(Debug, Clone, Error)]
pub enum BridgeClientError {
    /// The bridge did not answer within the transport deadline.
    #[error("bridge did not answer in time")]
    Timeout,

    /// The bridge refused the registration or session request.
    #[error("bridge refused the request")]
    NotAllowed,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait BridgeClientPort: Send + Sync {
    /// Scan the network for bridges. With `host` set, only that host is
    /// probed; an empty result means nothing answered there.
    async fn discover(&self, host: Option<&str>) -> Result<Vec<Bridge>, BridgeClientError>;

    /// Open a connection to the bridge, identifying as `local_uuid`.
    async fn connect(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
    ) -> Result<(), BridgeClientError>;

    /// Register `local_uuid` on the bridge under a display name, gated by
    /// the bridge's PIN.
    async fn register_app(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
        device_name: &str,
        pin: Pin,
    ) -> Result<(), BridgeClientError>;

    /// Start a session on an open connection. `take_over` displaces another
    /// connected controller instead of failing.
    async fn start_session(&self, bridge: &Bridge, take_over: bool)
        -> Result<(), BridgeClientError>;

    /// Close the connection. Safe to call after a failed handshake.
    async fn disconnect(&self, bridge: &Bridge) -> Result<(), BridgeClientError>;
}
