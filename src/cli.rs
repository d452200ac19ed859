//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ventlink", version, about = "Pair this hub with ventilation bridges on the local network")]
pub struct Cli {
    /// Override the application data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pairing wizard.
    Pair {
        /// Skip discovery and go straight to this host.
        #[arg(long)]
        host: Option<String>,

        /// PIN to register with (only used together with --host).
        #[arg(long)]
        pin: Option<String>,

        #[command(flatten)]
        transport: TransportArgs,
    },

    /// List paired bridges.
    List,

    /// Delete a paired bridge's record.
    Forget {
        /// Bridge uuid as shown by `list`.
        uuid: String,
    },

    /// Re-run the registration handshake for a paired bridge.
    Reauth {
        /// Bridge uuid as shown by `list`.
        uuid: String,

        #[command(flatten)]
        transport: TransportArgs,
    },

    /// Pair a known host without the interactive wizard.
    Import {
        /// Host of the bridge.
        host: String,

        /// Previously issued local identifier to reuse.
        #[arg(long)]
        token: Option<String>,

        #[command(flatten)]
        transport: TransportArgs,
    },
}

/// Transport selection.
///
/// The LAN transport lives in a separate adapter crate; until one is wired
/// in, the simulated transport is the only one this binary can offer.
#[derive(Debug, Args)]
pub struct TransportArgs {
    /// Talk to an in-process simulated bridge instead of the network.
    #[arg(long)]
    pub simulate: bool,

    /// PIN of the simulated bridge.
    #[arg(long, value_name = "PIN", default_value = "0000", requires = "simulate")]
    pub simulate_pin: String,
}
