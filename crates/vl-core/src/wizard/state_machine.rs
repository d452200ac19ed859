//! Pairing wizard state machine.
//!
//! Defines a pure state transition function for the bridge-pairing flow.
//! Side effects (discovery, the registration handshake, persistence) are
//! expressed as [`WizardAction`] values and executed by the orchestrator,
//! which feeds the results back in as follow-up events.

use crate::bridge::Bridge;
use crate::ids::BridgeUuid;
use crate::pairing::{PairingRecord, Pin};

/// Wizard flow state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WizardState {
    /// Nothing rendered yet; also the resting state of a silent reauth run.
    Idle,
    /// Bridge selection: discovered bridges plus a manual-entry escape hatch.
    SelectBridge {
        discovered: Vec<Bridge>,
        error: Option<FormError>,
    },
    /// Manual host entry with an optional PIN field.
    ManualEntry {
        host: Option<String>,
        error: Option<FormError>,
    },
    /// The bridge demands a PIN before it will grant a session.
    EnterPin { error: Option<FormError> },
    /// Terminal: a credential record was persisted.
    Completed { record: PairingRecord },
    /// Terminal without a new record.
    Aborted { reason: AbortReason },
}

impl WizardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Aborted { .. })
    }
}

/// Errors rendered inside a form, next to the field that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FormError {
    /// The bridge did not answer within the transport deadline.
    CannotConnect,
    /// No bridge answered on the given host.
    InvalidHost,
    /// The PIN is not a number between 0000 and 9999, or it was refused.
    InvalidPin,
    /// The selection does not match any discovered bridge.
    UnknownBridge,
}

/// Why a flow ended without creating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AbortReason {
    /// A record for this bridge already exists.
    AlreadyConfigured,
    /// A silent re-registration refreshed an existing record.
    ReauthSuccessful,
    /// A silent re-registration could not reach the bridge.
    CannotConnect,
    /// The user walked away.
    Cancelled,
}

/// Events that drive the wizard.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WizardEvent {
    /// Start an interactive flow.
    Begin,
    /// Start a silent re-registration for an existing record.
    BeginReauth,
    /// Discovery finished; already-configured bridges are filtered out.
    BridgesDiscovered { bridges: Vec<Bridge> },
    /// User picked a discovered bridge.
    SelectDiscovered { uuid: BridgeUuid },
    /// User asked for manual host entry.
    ChooseManual,
    /// User submitted the manual form.
    SubmitManual { host: String, pin_input: String },
    /// User submitted the PIN form.
    SubmitPin { pin_input: String },
    /// Probing a manually entered host found nothing.
    HostNotFound,
    /// The handshake completed and produced a record.
    RegistrationSucceeded { record: PairingRecord },
    /// The handshake completed for an already-stored record.
    ReauthSucceeded,
    /// The bridge did not answer within the transport deadline.
    RegistrationTimedOut,
    /// A PIN was supplied and the bridge refused the session.
    PinRejected,
    /// No PIN was supplied and the factory PIN was refused.
    PinRequired,
    /// The selected bridge already has a record.
    AlreadyConfigured,
    /// User abandoned the flow.
    Cancel,
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WizardAction {
    /// Scan the network, optionally restricted to one host.
    Discover { host: Option<String> },
    /// Probe a manually entered host, then run the handshake against it.
    ProbeAndRegister { host: String, pin: Option<Pin> },
    /// Run the registration handshake against the selected bridge.
    Register { pin: Option<Pin> },
    /// Write the credential record.
    PersistRecord { record: PairingRecord },
}

/// Pure wizard state machine, no side effects.
pub struct WizardStateMachine;

impl WizardStateMachine {
    pub fn transition(state: WizardState, event: WizardEvent) -> (WizardState, Vec<WizardAction>) {
        // Terminal states ignore everything.
        if state.is_terminal() {
            return (state, Vec::new());
        }
        if matches!(event, WizardEvent::Cancel) {
            return (
                WizardState::Aborted {
                    reason: AbortReason::Cancelled,
                },
                Vec::new(),
            );
        }

        match (state, event) {
            (WizardState::Idle, WizardEvent::Begin) => (
                WizardState::Idle,
                vec![WizardAction::Discover { host: None }],
            ),
            (WizardState::Idle, WizardEvent::BeginReauth) => (
                WizardState::Idle,
                vec![WizardAction::Register { pin: None }],
            ),
            (WizardState::Idle, WizardEvent::BridgesDiscovered { bridges }) => (
                WizardState::SelectBridge {
                    discovered: bridges,
                    error: None,
                },
                Vec::new(),
            ),
            // A re-scan refreshes the list but keeps the current form error,
            // so a connect timeout stays visible across the refresh.
            (
                WizardState::SelectBridge { error, .. },
                WizardEvent::BridgesDiscovered { bridges },
            ) => (
                WizardState::SelectBridge {
                    discovered: bridges,
                    error,
                },
                Vec::new(),
            ),
            (
                WizardState::SelectBridge { discovered, .. },
                WizardEvent::SelectDiscovered { uuid },
            ) => {
                if discovered.iter().any(|bridge| bridge.uuid == uuid) {
                    (
                        WizardState::SelectBridge {
                            discovered,
                            error: None,
                        },
                        vec![WizardAction::Register { pin: None }],
                    )
                } else {
                    (
                        WizardState::SelectBridge {
                            discovered,
                            error: Some(FormError::UnknownBridge),
                        },
                        Vec::new(),
                    )
                }
            }
            (WizardState::SelectBridge { .. }, WizardEvent::ChooseManual) => (
                WizardState::ManualEntry {
                    host: None,
                    error: None,
                },
                Vec::new(),
            ),
            // `Idle` accepts a manual submission too: the one-shot import
            // entry point skips the selection form entirely.
            (
                WizardState::ManualEntry { .. } | WizardState::Idle,
                WizardEvent::SubmitManual { host, pin_input },
            ) => {
                if host.trim().is_empty() {
                    return (
                        WizardState::ManualEntry {
                            host: None,
                            error: Some(FormError::InvalidHost),
                        },
                        Vec::new(),
                    );
                }
                let host = host.trim().to_string();
                match Pin::parse_optional(&pin_input) {
                    Err(_) => (
                        WizardState::ManualEntry {
                            host: Some(host),
                            error: Some(FormError::InvalidPin),
                        },
                        Vec::new(),
                    ),
                    Ok(pin) => (
                        WizardState::ManualEntry {
                            host: Some(host.clone()),
                            error: None,
                        },
                        vec![WizardAction::ProbeAndRegister { host, pin }],
                    ),
                }
            }
            (WizardState::ManualEntry { host, .. }, WizardEvent::HostNotFound) => (
                WizardState::ManualEntry {
                    host,
                    error: Some(FormError::InvalidHost),
                },
                Vec::new(),
            ),
            (WizardState::EnterPin { .. }, WizardEvent::SubmitPin { pin_input }) => {
                match Pin::parse(&pin_input) {
                    Err(_) => (
                        WizardState::EnterPin {
                            error: Some(FormError::InvalidPin),
                        },
                        Vec::new(),
                    ),
                    Ok(pin) => (
                        WizardState::EnterPin { error: None },
                        vec![WizardAction::Register { pin: Some(pin) }],
                    ),
                }
            }
            // Timeouts bounce back to whichever form the user was on; the
            // selection form additionally re-scans so the list stays fresh.
            (WizardState::SelectBridge { discovered, .. }, WizardEvent::RegistrationTimedOut) => (
                WizardState::SelectBridge {
                    discovered,
                    error: Some(FormError::CannotConnect),
                },
                vec![WizardAction::Discover { host: None }],
            ),
            (WizardState::ManualEntry { host, .. }, WizardEvent::RegistrationTimedOut) => (
                WizardState::ManualEntry {
                    host,
                    error: Some(FormError::CannotConnect),
                },
                Vec::new(),
            ),
            (WizardState::EnterPin { .. }, WizardEvent::RegistrationTimedOut) => (
                WizardState::EnterPin {
                    error: Some(FormError::CannotConnect),
                },
                Vec::new(),
            ),
            (WizardState::Idle, WizardEvent::RegistrationTimedOut) => (
                WizardState::Aborted {
                    reason: AbortReason::CannotConnect,
                },
                Vec::new(),
            ),
            (_, WizardEvent::PinRejected) => (
                WizardState::EnterPin {
                    error: Some(FormError::InvalidPin),
                },
                Vec::new(),
            ),
            (_, WizardEvent::PinRequired) => {
                (WizardState::EnterPin { error: None }, Vec::new())
            }
            (_, WizardEvent::RegistrationSucceeded { record }) => (
                WizardState::Completed {
                    record: record.clone(),
                },
                vec![WizardAction::PersistRecord { record }],
            ),
            (_, WizardEvent::ReauthSucceeded) => (
                WizardState::Aborted {
                    reason: AbortReason::ReauthSuccessful,
                },
                Vec::new(),
            ),
            (_, WizardEvent::AlreadyConfigured) => (
                WizardState::Aborted {
                    reason: AbortReason::AlreadyConfigured,
                },
                Vec::new(),
            ),
            (state, _event) => (state, Vec::new()),
        }
    }
}
