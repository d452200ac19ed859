mod cli;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, TransportArgs};
use shell::LoggingWizardEvents;
use vl_app::{ForgetBridge, ListBridges, WizardConfig, WizardOrchestrator};
use vl_core::pairing::Pin;
use vl_core::ports::{AppDirsPort, BridgeClientPort, PairingStorePort, SettingsPort};
use vl_core::settings::Settings;
use vl_infra::fs::PlatformAppDirs;
use vl_infra::settings::FileSettingsRepository;
use vl_infra::sim::{SimulatedAppliance, SimulatedBridgeClient};
use vl_infra::store::FilePairingStore;

/// Host and uuid of the appliance offered by `--simulate`.
const SIM_HOST: &str = "127.0.0.1";
const SIM_UUID: &str = "00000000002516100810c0ffee64b400";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let data_root = resolve_data_root(cli.data_dir)?;
    let store: Arc<dyn PairingStorePort> = Arc::new(FilePairingStore::with_base_dir(&data_root));
    let settings = FileSettingsRepository::with_base_dir(&data_root)
        .load()
        .await
        .context("load settings")?;

    match cli.command {
        Command::Pair {
            host,
            pin,
            transport,
        } => {
            let orchestrator = build_orchestrator(&settings, store, &transport)?;
            match host {
                // A host on the command line skips discovery entirely.
                Some(host) => {
                    orchestrator
                        .submit_manual(host, pin.unwrap_or_default())
                        .await?
                }
                None => orchestrator.begin().await?,
            };
            shell::run_to_completion(&orchestrator).await
        }
        Command::List => {
            let records = ListBridges::new(store).execute().await?;
            if records.is_empty() {
                println!("No bridges paired yet.");
                return Ok(());
            }
            for record in records {
                println!(
                    "{}  {}  paired {}",
                    record.bridge_uuid,
                    record.host,
                    record.paired_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            Ok(())
        }
        Command::Forget { uuid } => {
            ForgetBridge::new(store).execute(&uuid.as_str().into()).await?;
            println!("Forgot bridge {uuid}.");
            Ok(())
        }
        Command::Reauth { uuid, transport } => {
            let record = store
                .get(&uuid.as_str().into())
                .await?
                .with_context(|| format!("no paired bridge with uuid {uuid}"))?;
            let orchestrator = build_orchestrator(&settings, store, &transport)?;
            orchestrator.begin_reauth(record).await?;
            shell::run_to_completion(&orchestrator).await
        }
        Command::Import {
            host,
            token,
            transport,
        } => {
            let orchestrator = build_orchestrator(&settings, store, &transport)?;
            orchestrator.begin_import(host, token).await?;
            shell::run_to_completion(&orchestrator).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_data_root(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dirs = match override_dir {
        Some(dir) => PlatformAppDirs::with_root(dir),
        None => PlatformAppDirs::new(),
    };
    Ok(dirs.get_app_dirs().context("resolve data directory")?.app_data_root)
}

fn build_orchestrator(
    settings: &Settings,
    store: Arc<dyn PairingStorePort>,
    transport: &TransportArgs,
) -> Result<WizardOrchestrator> {
    let client = build_client(transport)?;
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    let config = WizardConfig::from_settings(settings, &hostname);
    Ok(WizardOrchestrator::new(
        config,
        client,
        store,
        Arc::new(LoggingWizardEvents),
    ))
}

fn build_client(transport: &TransportArgs) -> Result<Arc<dyn BridgeClientPort>> {
    if !transport.simulate {
        bail!(
            "no LAN bridge transport is wired into this build yet; \
             run with --simulate to pair against an in-process bridge"
        );
    }
    let pin = Pin::parse(&transport.simulate_pin)
        .map_err(|e| anyhow::anyhow!("--simulate-pin: {e}"))?;
    Ok(Arc::new(SimulatedBridgeClient::new(vec![
        SimulatedAppliance::new(SIM_HOST, SIM_UUID, pin),
    ])))
}
