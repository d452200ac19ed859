use std::sync::Arc;

use tokio::sync::Mutex;
use vl_core::wizard::WizardState;

/// Shared wizard context containing state and dispatch lock.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
/// - `dispatch_lock`: Used only for `dispatch` operations to serialize concurrent calls.
/// - `state`: Used for both reading (`get_state`) and writing (during `dispatch`).
#[derive(Clone)]
pub struct WizardContext {
    /// Current wizard state.
    state: Arc<Mutex<WizardState>>,
    /// Serializes dispatch calls to prevent concurrent state/action races.
    /// Ensures the entire transition + execute_actions + state_update runs atomically.
    /// Only acquired during `dispatch`, NOT during `get_state`.
    dispatch_lock: Arc<Mutex<()>>,
}

impl WizardContext {
    /// Creates a new WizardContext with the given initial state.
    pub fn new(initial_state: WizardState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a WizardContext in the initial `Idle` state.
    pub fn idle() -> Self {
        Self::new(WizardState::Idle)
    }

    /// Returns the context wrapped in Arc for shared ownership.
    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns a clone of the current state.
    ///
    /// This is a lightweight read operation that does NOT acquire `dispatch_lock`.
    pub async fn get_state(&self) -> WizardState {
        self.state.lock().await.clone()
    }

    /// Acquires the dispatch lock for serializing concurrent dispatch calls.
    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Updates the state to the given value.
    ///
    /// This should only be called after acquiring `dispatch_lock`.
    pub async fn set_state(&self, state: WizardState) {
        let mut guard = self.state.lock().await;
        *guard = state;
    }
}
