//! Terminal renderer for the wizard.
//!
//! Maps each wizard state to a prompt, feeds the answer back into the
//! orchestrator, and loops until the flow reaches a terminal state.

use std::io::{self, Write};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use vl_app::WizardOrchestrator;
use vl_core::wizard::{AbortReason, FormError, WizardState};

/// Event sink that mirrors wizard progress into the log stream.
pub struct LoggingWizardEvents;

#[async_trait]
impl vl_core::ports::WizardEventPort for LoggingWizardEvents {
    async fn emit_state_changed(&self, state: WizardState) {
        debug!(?state, "wizard state changed");
    }
}

/// Drive the wizard from its current state to a terminal one.
pub async fn run_to_completion(orchestrator: &WizardOrchestrator) -> Result<()> {
    loop {
        match orchestrator.state().await {
            WizardState::Idle => {
                orchestrator.begin().await?;
            }
            WizardState::SelectBridge { discovered, error } => {
                print_form_error(error);
                if discovered.is_empty() {
                    println!("No unpaired bridges answered the scan.");
                } else {
                    println!("Discovered bridges:");
                    for (index, bridge) in discovered.iter().enumerate() {
                        println!("  [{}] {}", index + 1, bridge);
                    }
                }
                println!("  [m] enter a host manually");
                println!("  [r] rescan");
                println!("  [q] quit");

                let input = prompt("Select")?;
                match input.as_str() {
                    "q" => {
                        orchestrator.cancel().await?;
                    }
                    "m" => {
                        orchestrator.choose_manual().await?;
                    }
                    "r" => {
                        orchestrator.begin().await?;
                    }
                    other => {
                        let selected = other
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| discovered.get(i));
                        match selected {
                            Some(bridge) => {
                                println!("Pairing with {}...", bridge.host);
                                orchestrator.select_bridge(bridge.uuid.clone()).await?;
                            }
                            None => println!("Not a valid choice."),
                        }
                    }
                }
            }
            WizardState::ManualEntry { host, error } => {
                print_form_error(error);
                let host_input = match &host {
                    Some(previous) => {
                        let input = prompt(&format!("Bridge host [{previous}]"))?;
                        if input.is_empty() {
                            previous.clone()
                        } else {
                            input
                        }
                    }
                    None => prompt("Bridge host")?,
                };
                let pin_input = prompt("PIN (leave empty for the factory PIN)")?;
                println!("Looking for a bridge on {host_input}...");
                orchestrator.submit_manual(host_input, pin_input).await?;
            }
            WizardState::EnterPin { error } => {
                print_form_error(error);
                let pin_input = prompt("Bridge PIN (0000-9999)")?;
                orchestrator.submit_pin(pin_input).await?;
            }
            WizardState::Completed { record } => {
                println!("Paired with {} ({}).", record.name, record.bridge_uuid);
                println!("Local identifier: {}", record.local_uuid);
                return Ok(());
            }
            WizardState::Aborted { reason } => {
                println!("{}", describe_abort(reason));
                return Ok(());
            }
        }
    }
}

fn print_form_error(error: Option<FormError>) {
    if let Some(error) = error {
        println!("! {}", describe_form_error(error));
    }
}

fn describe_form_error(error: FormError) -> &'static str {
    match error {
        FormError::CannotConnect => "The bridge did not answer in time.",
        FormError::InvalidHost => "No bridge answered on that host.",
        FormError::InvalidPin => "A PIN must be between 0000 and 9999, and match the bridge.",
        FormError::UnknownBridge => "That bridge is not in the discovered list.",
    }
}

fn describe_abort(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::AlreadyConfigured => "This bridge is already paired.",
        AbortReason::ReauthSuccessful => "Re-authentication successful.",
        AbortReason::CannotConnect => "The bridge did not answer in time.",
        AbortReason::Cancelled => "Pairing cancelled.",
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
