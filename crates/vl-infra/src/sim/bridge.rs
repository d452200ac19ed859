//! Simulated appliances behind the bridge transport port.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use vl_core::ids::{BridgeUuid, LocalUuid};
use vl_core::pairing::Pin;
use vl_core::ports::{BridgeClientError, BridgeClientPort};
use vl_core::Bridge;

/// One simulated appliance on the fake LAN.
#[derive(Debug, Clone)]
pub struct SimulatedAppliance {
    pub bridge: Bridge,
    /// PIN the appliance accepts for registration.
    pub pin: Pin,
}

impl SimulatedAppliance {
    pub fn new(host: impl Into<String>, uuid: impl Into<BridgeUuid>, pin: Pin) -> Self {
        Self {
            bridge: Bridge::new(host, uuid),
            pin,
        }
    }
}

#[derive(Default)]
struct SimState {
    /// Apps each appliance has accepted a registration from.
    registered: HashMap<BridgeUuid, HashSet<LocalUuid>>,
    /// Which local uuid is currently connected to each appliance.
    connected: HashMap<BridgeUuid, LocalUuid>,
}

/// Simulated bridge transport.
///
/// Hosts that match no appliance behave like an unplugged cable: connects
/// time out and targeted scans come back empty.
pub struct SimulatedBridgeClient {
    appliances: Vec<SimulatedAppliance>,
    state: Mutex<SimState>,
}

impl SimulatedBridgeClient {
    pub fn new(appliances: Vec<SimulatedAppliance>) -> Self {
        Self {
            appliances,
            state: Mutex::new(SimState::default()),
        }
    }

    fn appliance(&self, uuid: &BridgeUuid) -> Option<&SimulatedAppliance> {
        self.appliances.iter().find(|a| &a.bridge.uuid == uuid)
    }

    /// Pre-register an app, as if a previous pairing already happened.
    pub async fn preregister(&self, uuid: &BridgeUuid, local_uuid: LocalUuid) {
        let mut state = self.state.lock().await;
        state
            .registered
            .entry(uuid.clone())
            .or_default()
            .insert(local_uuid);
    }
}

#[async_trait]
impl BridgeClientPort for SimulatedBridgeClient {
    async fn discover(&self, host: Option<&str>) -> Result<Vec<Bridge>, BridgeClientError> {
        let bridges = self
            .appliances
            .iter()
            .filter(|a| host.map_or(true, |h| a.bridge.host == h))
            .map(|a| a.bridge.clone())
            .collect();
        Ok(bridges)
    }

    async fn connect(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
    ) -> Result<(), BridgeClientError> {
        if self.appliance(&bridge.uuid).is_none() {
            return Err(BridgeClientError::Timeout);
        }
        let mut state = self.state.lock().await;
        state
            .connected
            .insert(bridge.uuid.clone(), local_uuid.clone());
        debug!(host = %bridge.host, "simulated bridge connected");
        Ok(())
    }

    async fn register_app(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
        _device_name: &str,
        pin: Pin,
    ) -> Result<(), BridgeClientError> {
        let appliance = self
            .appliance(&bridge.uuid)
            .ok_or(BridgeClientError::Timeout)?;
        if pin != appliance.pin {
            return Err(BridgeClientError::NotAllowed);
        }
        let mut state = self.state.lock().await;
        state
            .registered
            .entry(bridge.uuid.clone())
            .or_default()
            .insert(local_uuid.clone());
        Ok(())
    }

    async fn start_session(
        &self,
        bridge: &Bridge,
        _take_over: bool,
    ) -> Result<(), BridgeClientError> {
        let state = self.state.lock().await;
        let connected = state
            .connected
            .get(&bridge.uuid)
            .ok_or_else(|| BridgeClientError::Transport("session start before connect".into()))?;
        let registered = state
            .registered
            .get(&bridge.uuid)
            .map_or(false, |apps| apps.contains(connected));
        if registered {
            Ok(())
        } else {
            Err(BridgeClientError::NotAllowed)
        }
    }

    async fn disconnect(&self, bridge: &Bridge) -> Result<(), BridgeClientError> {
        let mut state = self.state.lock().await;
        state.connected.remove(&bridge.uuid);
        Ok(())
    }
}
