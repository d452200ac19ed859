use async_trait::async_trait;

use crate::wizard::WizardState;

/// Outbound notifications about wizard progress, consumed by whatever shell
/// renders the flow.
#[async_trait]
pub trait WizardEventPort: Send + Sync {
    async fn emit_state_changed(&self, state: WizardState);
}
