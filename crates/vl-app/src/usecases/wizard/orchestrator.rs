//! Wizard orchestrator.
//!
//! Coordinates the pure wizard state machine with the bridge transport and
//! the pairing store. Every user interaction becomes an event; the state
//! machine answers with actions; executing an action may produce follow-up
//! events that are fed straight back into the machine. The registration
//! handshake sequencing, including its three recoverable failure branches,
//! lives here.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use vl_core::{
    bridge::Bridge,
    ids::LocalUuid,
    pairing::{PairingRecord, Pin},
    ports::{BridgeClientError, BridgeClientPort, PairingStorePort, WizardEventPort},
    settings::Settings,
    wizard::{WizardAction, WizardEvent, WizardState, WizardStateMachine},
    BridgeUuid,
};

use crate::usecases::wizard::context::WizardContext;

/// Errors produced by the wizard orchestrator.
///
/// Recoverable transport failures (timeouts, refused registrations) never
/// surface here; they are routed back into the state machine as events.
#[derive(Debug, thiserror::Error)]
pub enum WizardOrchestratorError {
    #[error("bridge transport failed: {0}")]
    Client(#[from] BridgeClientError),
    #[error("pairing store failed: {0}")]
    Store(#[from] vl_core::ports::PairingStoreError),
    #[error("no bridge selected for registration")]
    NoBridgeSelected,
}

/// Wizard orchestrator configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Product name used in the registration display name.
    pub app_display_name: String,
    /// Hub name appended to the display name, so installers can tell
    /// multiple hubs apart on the appliance side.
    pub hub_name: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            app_display_name: "VentLink".to_string(),
            hub_name: "Home".to_string(),
        }
    }
}

impl WizardConfig {
    pub fn from_settings(settings: &Settings, fallback_hub_name: &str) -> Self {
        Self {
            app_display_name: "VentLink".to_string(),
            hub_name: settings
                .general
                .hub_name
                .clone()
                .unwrap_or_else(|| fallback_hub_name.to_string()),
        }
    }
}

/// How the flow was entered. Decides the unique-bridge guard and the
/// terminal event of a successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowMode {
    User,
    Import,
    Reauth,
}

/// Result of one run of the registration handshake.
enum RegistrationOutcome {
    Registered,
    TimedOut,
    PinRejected,
    PinRequired,
}

/// Orchestrator that drives wizard state and side effects.
pub struct WizardOrchestrator {
    context: Arc<WizardContext>,
    config: WizardConfig,

    client: Arc<dyn BridgeClientPort>,
    store: Arc<dyn PairingStorePort>,
    event_port: Arc<dyn WizardEventPort>,

    selected_bridge: Arc<Mutex<Option<Bridge>>>,
    local_uuid: Arc<Mutex<Option<LocalUuid>>>,
    mode: Arc<Mutex<FlowMode>>,
}

impl WizardOrchestrator {
    pub fn new(
        config: WizardConfig,
        client: Arc<dyn BridgeClientPort>,
        store: Arc<dyn PairingStorePort>,
        event_port: Arc<dyn WizardEventPort>,
    ) -> Self {
        Self {
            context: WizardContext::idle().arc(),
            config,
            client,
            store,
            event_port,
            selected_bridge: Arc::new(Mutex::new(None)),
            local_uuid: Arc::new(Mutex::new(None)),
            mode: Arc::new(Mutex::new(FlowMode::User)),
        }
    }

    /// Start the interactive flow: scan the network and render the
    /// selection form.
    pub async fn begin(&self) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::Begin).await
    }

    /// User picked a discovered bridge on the selection form.
    pub async fn select_bridge(
        &self,
        uuid: BridgeUuid,
    ) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::SelectDiscovered { uuid }).await
    }

    /// User asked for manual host entry.
    pub async fn choose_manual(&self) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::ChooseManual).await
    }

    /// User submitted the manual form.
    pub async fn submit_manual(
        &self,
        host: String,
        pin_input: String,
    ) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::SubmitManual { host, pin_input })
            .await
    }

    /// User submitted the PIN form.
    pub async fn submit_pin(
        &self,
        pin_input: String,
    ) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::SubmitPin { pin_input }).await
    }

    /// User abandoned the flow.
    pub async fn cancel(&self) -> Result<WizardState, WizardOrchestratorError> {
        self.dispatch(WizardEvent::Cancel).await
    }

    /// One-shot entry from a legacy configuration file: a known host and an
    /// optional previously issued local identifier.
    pub async fn begin_import(
        &self,
        host: String,
        token: Option<String>,
    ) -> Result<WizardState, WizardOrchestratorError> {
        *self.mode.lock().await = FlowMode::Import;
        if let Some(token) = token {
            *self.local_uuid.lock().await = Some(LocalUuid::from(token));
        }
        self.dispatch(WizardEvent::SubmitManual {
            host,
            pin_input: String::new(),
        })
        .await
    }

    /// Silent re-registration for an existing record. Falls into the PIN
    /// step only when the bridge demands it.
    pub async fn begin_reauth(
        &self,
        record: PairingRecord,
    ) -> Result<WizardState, WizardOrchestratorError> {
        *self.mode.lock().await = FlowMode::Reauth;
        *self.selected_bridge.lock().await =
            Some(Bridge::new(record.host.clone(), record.bridge_uuid.clone()));
        *self.local_uuid.lock().await = Some(record.local_uuid.clone());
        self.dispatch(WizardEvent::BeginReauth).await
    }

    pub async fn state(&self) -> WizardState {
        self.context.get_state().await
    }

    async fn dispatch(
        &self,
        event: WizardEvent,
    ) -> Result<WizardState, WizardOrchestratorError> {
        let event = self.capture_context(event).await;
        // Serialize concurrent dispatch calls so two callers never read the
        // same state and execute duplicate actions.
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!("usecase.wizard.dispatch", event = ?event);
        async {
            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.clone();
                let event_name = format!("{:?}", event);
                let (next, actions) = WizardStateMachine::transition(current, event);
                info!(from = ?from, to = ?next, event = %event_name, "wizard state transition");
                let follow_up_events = self.execute_actions(actions).await?;
                self.set_state_and_emit(next.clone()).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            Ok(current)
        }
        .instrument(span)
        .await
    }

    /// Remember flow context a later action will need. The selected bridge
    /// is resolved against the list the selection form was rendered from.
    async fn capture_context(&self, event: WizardEvent) -> WizardEvent {
        if let WizardEvent::SelectDiscovered { uuid } = &event {
            if let WizardState::SelectBridge { discovered, .. } = self.context.get_state().await {
                if let Some(bridge) = discovered.into_iter().find(|b| &b.uuid == uuid) {
                    *self.selected_bridge.lock().await = Some(bridge);
                }
            }
        }
        event
    }

    async fn execute_actions(
        &self,
        actions: Vec<WizardAction>,
    ) -> Result<Vec<WizardEvent>, WizardOrchestratorError> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "wizard executing action");
            match action {
                WizardAction::Discover { host } => {
                    follow_up_events.push(self.discover(host.as_deref()).await?);
                }
                WizardAction::ProbeAndRegister { host, pin } => {
                    match self.probe_host(&host).await? {
                        None => follow_up_events.push(WizardEvent::HostNotFound),
                        Some(bridge) => {
                            *self.selected_bridge.lock().await = Some(bridge.clone());
                            follow_up_events.push(self.guard_and_register(&bridge, pin).await?);
                        }
                    }
                }
                WizardAction::Register { pin } => {
                    let bridge = { self.selected_bridge.lock().await.clone() }
                        .ok_or(WizardOrchestratorError::NoBridgeSelected)?;
                    follow_up_events.push(self.guard_and_register(&bridge, pin).await?);
                }
                WizardAction::PersistRecord { record } => {
                    info!(
                        bridge_uuid = %record.bridge_uuid,
                        host = %record.host,
                        "persisting pairing record"
                    );
                    self.store.upsert(record).await?;
                }
            }
        }

        Ok(follow_up_events)
    }

    /// Scan the network and drop bridges that already have a record, so the
    /// selection form never offers a second pairing with the same appliance.
    async fn discover(
        &self,
        host: Option<&str>,
    ) -> Result<WizardEvent, WizardOrchestratorError> {
        let bridges = match self.client.discover(host).await {
            Ok(bridges) => bridges,
            Err(err) => {
                warn!(error = %err, "bridge discovery failed");
                Vec::new()
            }
        };

        let configured: HashSet<BridgeUuid> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .map(|record| record.bridge_uuid)
            .collect();

        let mut bridges: Vec<Bridge> = bridges
            .into_iter()
            .filter(|bridge| !configured.contains(&bridge.uuid))
            .collect();
        bridges.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        bridges.dedup_by(|a, b| a.uuid == b.uuid);

        Ok(WizardEvent::BridgesDiscovered { bridges })
    }

    /// Probe a manually entered host. An unreachable host behaves like an
    /// empty probe: the manual form reports it, nothing aborts.
    async fn probe_host(
        &self,
        host: &str,
    ) -> Result<Option<Bridge>, WizardOrchestratorError> {
        match self.client.discover(Some(host)).await {
            Ok(bridges) => Ok(bridges.into_iter().next()),
            Err(BridgeClientError::Timeout) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn guard_and_register(
        &self,
        bridge: &Bridge,
        pin: Option<Pin>,
    ) -> Result<WizardEvent, WizardOrchestratorError> {
        let mode = *self.mode.lock().await;

        // A bridge may only be configured once. Reauth operates on the
        // existing record, so the guard does not apply there.
        if mode != FlowMode::Reauth && self.store.get(&bridge.uuid).await?.is_some() {
            return Ok(WizardEvent::AlreadyConfigured);
        }

        let local_uuid = self.local_uuid_or_generate().await;
        let outcome = self.run_registration(bridge, &local_uuid, pin).await?;

        Ok(match outcome {
            RegistrationOutcome::Registered if mode == FlowMode::Reauth => {
                WizardEvent::ReauthSucceeded
            }
            RegistrationOutcome::Registered => WizardEvent::RegistrationSucceeded {
                record: PairingRecord::new(bridge, local_uuid, Utc::now()),
            },
            RegistrationOutcome::TimedOut => WizardEvent::RegistrationTimedOut,
            RegistrationOutcome::PinRejected => WizardEvent::PinRejected,
            RegistrationOutcome::PinRequired => WizardEvent::PinRequired,
        })
    }

    /// One run of the registration handshake.
    ///
    /// Connects, optionally registers with the supplied PIN, then starts a
    /// session. A refused session without a PIN triggers one silent attempt
    /// with the factory PIN before the user is asked. The connection is
    /// closed on every path.
    async fn run_registration(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
        pin: Option<Pin>,
    ) -> Result<RegistrationOutcome, WizardOrchestratorError> {
        match self.client.connect(bridge, local_uuid).await {
            Ok(()) => {}
            Err(BridgeClientError::Timeout) => return Ok(RegistrationOutcome::TimedOut),
            Err(err) => return Err(err.into()),
        }

        let outcome = self.registration_sequence(bridge, local_uuid, pin).await;

        if let Err(err) = self.client.disconnect(bridge).await {
            warn!(host = %bridge.host, error = %err, "bridge disconnect failed");
        }

        outcome
    }

    async fn registration_sequence(
        &self,
        bridge: &Bridge,
        local_uuid: &LocalUuid,
        pin: Option<Pin>,
    ) -> Result<RegistrationOutcome, WizardOrchestratorError> {
        let device_name = self.device_name();

        if let Some(pin) = pin {
            match self
                .client
                .register_app(bridge, local_uuid, &device_name, pin)
                .await
            {
                Ok(()) => {}
                // Already registered; the session start decides whether the
                // PIN was actually right.
                Err(BridgeClientError::NotAllowed) => {
                    debug!(host = %bridge.host, "app already registered, starting session");
                }
                Err(BridgeClientError::Timeout) => return Ok(RegistrationOutcome::TimedOut),
                Err(err) => return Err(err.into()),
            }
        }

        match self.client.start_session(bridge, true).await {
            Ok(()) => return Ok(RegistrationOutcome::Registered),
            Err(BridgeClientError::NotAllowed) if pin.is_some() => {
                return Ok(RegistrationOutcome::PinRejected)
            }
            Err(BridgeClientError::NotAllowed) => {}
            Err(BridgeClientError::Timeout) => return Ok(RegistrationOutcome::TimedOut),
            Err(err) => return Err(err.into()),
        }

        // No PIN was supplied and the bridge refused the session. Most
        // installations keep the factory PIN, so try that once before
        // bothering the user.
        match self
            .client
            .register_app(bridge, local_uuid, &device_name, Pin::DEFAULT)
            .await
        {
            Ok(()) => {}
            Err(BridgeClientError::NotAllowed) => return Ok(RegistrationOutcome::PinRequired),
            Err(BridgeClientError::Timeout) => return Ok(RegistrationOutcome::TimedOut),
            Err(err) => return Err(err.into()),
        }

        match self.client.start_session(bridge, true).await {
            Ok(()) => Ok(RegistrationOutcome::Registered),
            Err(BridgeClientError::NotAllowed) => Ok(RegistrationOutcome::PinRequired),
            Err(BridgeClientError::Timeout) => Ok(RegistrationOutcome::TimedOut),
            Err(err) => Err(err.into()),
        }
    }

    async fn local_uuid_or_generate(&self) -> LocalUuid {
        let mut guard = self.local_uuid.lock().await;
        guard.get_or_insert_with(LocalUuid::generate).clone()
    }

    fn device_name(&self) -> String {
        format!(
            "{} ({})",
            self.config.app_display_name, self.config.hub_name
        )
    }

    async fn set_state_and_emit(&self, state: WizardState) {
        self.context.set_state(state.clone()).await;
        self.event_port.emit_state_changed(state).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as TokioMutex;
    use vl_core::ports::PairingStoreError;
    use vl_core::wizard::{AbortReason, FormError};

    /// Transport double behaving like one appliance with a configurable PIN.
    struct ScriptedClient {
        discovered: Vec<Bridge>,
        /// `Some(err)` makes `connect` fail with that error.
        connect_error: Option<BridgeClientError>,
        /// PIN the appliance accepts for registration.
        accepted_pin: Pin,
        /// Session starts succeed without any registration.
        preregistered: bool,
        registered: TokioMutex<bool>,
        register_calls: TokioMutex<Vec<(Pin, String)>>,
        disconnects: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(discovered: Vec<Bridge>) -> Self {
            Self {
                discovered,
                connect_error: None,
                accepted_pin: Pin::DEFAULT,
                preregistered: false,
                registered: TokioMutex::new(false),
                register_calls: TokioMutex::new(Vec::new()),
                disconnects: AtomicUsize::new(0),
            }
        }

        fn with_pin(mut self, pin: Pin) -> Self {
            self.accepted_pin = pin;
            self
        }

        fn with_connect_error(mut self, error: BridgeClientError) -> Self {
            self.connect_error = Some(error);
            self
        }

        fn preregistered(mut self) -> Self {
            self.preregistered = true;
            self
        }

        async fn register_calls(&self) -> Vec<(Pin, String)> {
            self.register_calls.lock().await.clone()
        }

        fn disconnect_count(&self) -> usize {
            self.disconnects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BridgeClientPort for ScriptedClient {
        async fn discover(&self, host: Option<&str>) -> Result<Vec<Bridge>, BridgeClientError> {
            Ok(match host {
                None => self.discovered.clone(),
                Some(host) => self
                    .discovered
                    .iter()
                    .filter(|bridge| bridge.host == host)
                    .cloned()
                    .collect(),
            })
        }

        async fn connect(
            &self,
            _bridge: &Bridge,
            _local_uuid: &LocalUuid,
        ) -> Result<(), BridgeClientError> {
            match &self.connect_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        async fn register_app(
            &self,
            _bridge: &Bridge,
            _local_uuid: &LocalUuid,
            device_name: &str,
            pin: Pin,
        ) -> Result<(), BridgeClientError> {
            self.register_calls
                .lock()
                .await
                .push((pin, device_name.to_string()));
            if pin == self.accepted_pin {
                *self.registered.lock().await = true;
                Ok(())
            } else {
                Err(BridgeClientError::NotAllowed)
            }
        }

        async fn start_session(
            &self,
            _bridge: &Bridge,
            _take_over: bool,
        ) -> Result<(), BridgeClientError> {
            if self.preregistered || *self.registered.lock().await {
                Ok(())
            } else {
                Err(BridgeClientError::NotAllowed)
            }
        }

        async fn disconnect(&self, _bridge: &Bridge) -> Result<(), BridgeClientError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: TokioMutex<HashMap<String, PairingRecord>>,
        upserts: AtomicUsize,
    }

    impl MemoryStore {
        async fn with_record(record: PairingRecord) -> Self {
            let store = Self::default();
            store
                .records
                .lock()
                .await
                .insert(record.bridge_uuid.to_string(), record);
            store
        }

        fn upsert_count(&self) -> usize {
            self.upserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PairingStorePort for MemoryStore {
        async fn get(
            &self,
            uuid: &BridgeUuid,
        ) -> Result<Option<PairingRecord>, PairingStoreError> {
            Ok(self.records.lock().await.get(uuid.as_ref()).cloned())
        }

        async fn list_all(&self) -> Result<Vec<PairingRecord>, PairingStoreError> {
            Ok(self.records.lock().await.values().cloned().collect())
        }

        async fn upsert(&self, record: PairingRecord) -> Result<(), PairingStoreError> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .await
                .insert(record.bridge_uuid.to_string(), record);
            Ok(())
        }

        async fn delete(&self, uuid: &BridgeUuid) -> Result<(), PairingStoreError> {
            self.records
                .lock()
                .await
                .remove(uuid.as_ref())
                .map(|_| ())
                .ok_or(PairingStoreError::NotFound)
        }
    }

    #[derive(Default)]
    struct RecordingEventPort {
        states: TokioMutex<Vec<WizardState>>,
    }

    impl RecordingEventPort {
        async fn snapshot(&self) -> Vec<WizardState> {
            self.states.lock().await.clone()
        }
    }

    #[async_trait]
    impl WizardEventPort for RecordingEventPort {
        async fn emit_state_changed(&self, state: WizardState) {
            self.states.lock().await.push(state);
        }
    }

    fn test_config() -> WizardConfig {
        WizardConfig {
            app_display_name: "VentLink".to_string(),
            hub_name: "TestHub".to_string(),
        }
    }

    fn bridge(host: &str, uuid: &str) -> Bridge {
        Bridge::new(host, uuid)
    }

    fn build_orchestrator(
        client: Arc<ScriptedClient>,
        store: Arc<MemoryStore>,
    ) -> WizardOrchestrator {
        WizardOrchestrator::new(
            test_config(),
            client,
            store,
            Arc::new(RecordingEventPort::default()),
        )
    }

    #[tokio::test]
    async fn begin_lists_only_unconfigured_bridges() {
        let configured = bridge("10.0.0.1", "uuid-a");
        let fresh = bridge("10.0.0.2", "uuid-b");
        let client = Arc::new(ScriptedClient::new(vec![configured.clone(), fresh.clone()]));
        let record = PairingRecord::new(&configured, LocalUuid::generate(), Utc::now());
        let store = Arc::new(MemoryStore::with_record(record).await);
        let orchestrator = build_orchestrator(client, store);

        let state = orchestrator.begin().await.unwrap();

        assert_eq!(
            state,
            WizardState::SelectBridge {
                discovered: vec![fresh],
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn selecting_a_factory_pin_bridge_completes_and_persists() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(ScriptedClient::new(vec![discovered.clone()]));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client.clone(), store.clone());

        orchestrator.begin().await.unwrap();
        let state = orchestrator.select_bridge("uuid-1".into()).await.unwrap();

        match state {
            WizardState::Completed { record } => {
                assert_eq!(record.host, "10.0.0.7");
                assert_eq!(record.bridge_uuid.as_ref(), "uuid-1");
                assert_eq!(record.local_uuid.len(), 32);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
        assert_eq!(store.upsert_count(), 1);

        // Exactly one silent factory-PIN registration, correctly labelled.
        let calls = client.register_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Pin::DEFAULT);
        assert_eq!(calls[0].1, "VentLink (TestHub)");
        assert_eq!(client.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn preregistered_bridge_skips_registration_entirely() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(ScriptedClient::new(vec![discovered]).preregistered());
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client.clone(), store);

        orchestrator.begin().await.unwrap();
        let state = orchestrator.select_bridge("uuid-1".into()).await.unwrap();

        assert!(matches!(state, WizardState::Completed { .. }));
        assert!(client.register_calls().await.is_empty());
    }

    #[tokio::test]
    async fn custom_pin_bridge_walks_through_the_pin_step() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(
            ScriptedClient::new(vec![discovered]).with_pin(Pin::parse("4711").unwrap()),
        );
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client.clone(), store.clone());

        orchestrator.begin().await.unwrap();
        let state = orchestrator.select_bridge("uuid-1".into()).await.unwrap();
        // Factory PIN refused, no user PIN yet: ask for one, no error shown.
        assert_eq!(state, WizardState::EnterPin { error: None });

        let state = orchestrator.submit_pin("9999".to_string()).await.unwrap();
        assert_eq!(
            state,
            WizardState::EnterPin {
                error: Some(FormError::InvalidPin)
            }
        );

        let state = orchestrator.submit_pin("4711".to_string()).await.unwrap();
        assert!(matches!(state, WizardState::Completed { .. }));
        assert_eq!(store.upsert_count(), 1);
    }

    #[tokio::test]
    async fn local_uuid_is_stable_across_pin_retries() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(
            ScriptedClient::new(vec![discovered]).with_pin(Pin::parse("4711").unwrap()),
        );
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store);

        orchestrator.begin().await.unwrap();
        orchestrator.select_bridge("uuid-1".into()).await.unwrap();
        let first = orchestrator.local_uuid.lock().await.clone().unwrap();

        orchestrator.submit_pin("0001".to_string()).await.unwrap();
        let state = orchestrator.submit_pin("4711".to_string()).await.unwrap();

        match state {
            WizardState::Completed { record } => assert_eq!(record.local_uuid, first),
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_timeout_reports_cannot_connect_and_rescans() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(
            ScriptedClient::new(vec![discovered.clone()])
                .with_connect_error(BridgeClientError::Timeout),
        );
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store);

        orchestrator.begin().await.unwrap();
        let state = orchestrator.select_bridge("uuid-1".into()).await.unwrap();

        assert_eq!(
            state,
            WizardState::SelectBridge {
                discovered: vec![discovered],
                error: Some(FormError::CannotConnect),
            }
        );
    }

    #[tokio::test]
    async fn already_configured_bridge_aborts() {
        let discovered = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(ScriptedClient::new(vec![discovered.clone()]));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store.clone());

        orchestrator.begin().await.unwrap();
        // The record appears between the scan and the selection, e.g. from a
        // concurrently finishing flow.
        let record = PairingRecord::new(&discovered, LocalUuid::generate(), Utc::now());
        store.upsert(record).await.unwrap();
        let upserts_before = store.upsert_count();

        let state = orchestrator.select_bridge("uuid-1".into()).await.unwrap();

        assert_eq!(
            state,
            WizardState::Aborted {
                reason: AbortReason::AlreadyConfigured
            }
        );
        assert_eq!(store.upsert_count(), upserts_before);
    }

    #[tokio::test]
    async fn manual_host_without_a_bridge_reports_invalid_host() {
        let client = Arc::new(ScriptedClient::new(vec![bridge("10.0.0.7", "uuid-1")]));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store);

        orchestrator.begin().await.unwrap();
        orchestrator.choose_manual().await.unwrap();
        let state = orchestrator
            .submit_manual("10.9.9.9".to_string(), String::new())
            .await
            .unwrap();

        assert_eq!(
            state,
            WizardState::ManualEntry {
                host: Some("10.9.9.9".to_string()),
                error: Some(FormError::InvalidHost),
            }
        );
    }

    #[tokio::test]
    async fn manual_host_with_pin_registers_with_that_pin() {
        let target = bridge("10.0.0.7", "uuid-1");
        let pin = Pin::parse("4711").unwrap();
        let client = Arc::new(ScriptedClient::new(vec![target]).with_pin(pin));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client.clone(), store);

        orchestrator.begin().await.unwrap();
        orchestrator.choose_manual().await.unwrap();
        let state = orchestrator
            .submit_manual("10.0.0.7".to_string(), "4711".to_string())
            .await
            .unwrap();

        assert!(matches!(state, WizardState::Completed { .. }));
        let calls = client.register_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, pin);
    }

    #[tokio::test]
    async fn import_reuses_the_supplied_token_as_local_uuid() {
        let target = bridge("10.0.0.7", "uuid-1");
        let client = Arc::new(ScriptedClient::new(vec![target]));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store);

        let token = "deadbeefdeadbeefdeadbeefdeadbeef".to_string();
        let state = orchestrator
            .begin_import("10.0.0.7".to_string(), Some(token.clone()))
            .await
            .unwrap();

        match state {
            WizardState::Completed { record } => {
                assert_eq!(record.local_uuid.as_ref(), token);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reauth_succeeds_without_rewriting_the_record() {
        let target = bridge("10.0.0.7", "uuid-1");
        let record = PairingRecord::new(&target, LocalUuid::generate(), Utc::now());
        let client = Arc::new(ScriptedClient::new(vec![target]).preregistered());
        let store = Arc::new(MemoryStore::with_record(record.clone()).await);
        let orchestrator = build_orchestrator(client, store.clone());

        let state = orchestrator.begin_reauth(record).await.unwrap();

        assert_eq!(
            state,
            WizardState::Aborted {
                reason: AbortReason::ReauthSuccessful
            }
        );
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test]
    async fn reauth_timeout_aborts_with_cannot_connect() {
        let target = bridge("10.0.0.7", "uuid-1");
        let record = PairingRecord::new(&target, LocalUuid::generate(), Utc::now());
        let client = Arc::new(
            ScriptedClient::new(vec![target]).with_connect_error(BridgeClientError::Timeout),
        );
        let store = Arc::new(MemoryStore::with_record(record.clone()).await);
        let orchestrator = build_orchestrator(client, store);

        let state = orchestrator.begin_reauth(record).await.unwrap();

        assert_eq!(
            state,
            WizardState::Aborted {
                reason: AbortReason::CannotConnect
            }
        );
    }

    #[tokio::test]
    async fn reauth_with_changed_pin_falls_into_the_pin_step() {
        let target = bridge("10.0.0.7", "uuid-1");
        let record = PairingRecord::new(&target, LocalUuid::generate(), Utc::now());
        let pin = Pin::parse("2222").unwrap();
        let client = Arc::new(ScriptedClient::new(vec![target]).with_pin(pin));
        let store = Arc::new(MemoryStore::with_record(record.clone()).await);
        let orchestrator = build_orchestrator(client, store.clone());

        let state = orchestrator.begin_reauth(record.clone()).await.unwrap();
        assert_eq!(state, WizardState::EnterPin { error: None });

        let state = orchestrator.submit_pin("2222".to_string()).await.unwrap();
        assert_eq!(
            state,
            WizardState::Aborted {
                reason: AbortReason::ReauthSuccessful
            }
        );
        // The stored record keeps its original local identifier.
        let stored = store.get(&record.bridge_uuid).await.unwrap().unwrap();
        assert_eq!(stored.local_uuid, record.local_uuid);
    }

    #[tokio::test]
    async fn cancel_aborts_the_flow() {
        let client = Arc::new(ScriptedClient::new(Vec::new()));
        let store = Arc::new(MemoryStore::default());
        let orchestrator = build_orchestrator(client, store);

        orchestrator.begin().await.unwrap();
        let state = orchestrator.cancel().await.unwrap();

        assert_eq!(
            state,
            WizardState::Aborted {
                reason: AbortReason::Cancelled
            }
        );
    }

    #[tokio::test]
    async fn state_changes_are_emitted_to_the_event_port() {
        let client = Arc::new(ScriptedClient::new(vec![bridge("10.0.0.7", "uuid-1")]));
        let store = Arc::new(MemoryStore::default());
        let event_port = Arc::new(RecordingEventPort::default());
        let orchestrator = WizardOrchestrator::new(
            test_config(),
            client,
            store,
            event_port.clone(),
        );

        orchestrator.begin().await.unwrap();

        let emitted = event_port.snapshot().await;
        assert!(emitted
            .iter()
            .any(|state| matches!(state, WizardState::SelectBridge { .. })));
    }
}
