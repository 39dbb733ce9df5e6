
//! Inbound delivery bot
//!
//! Usage:
//!   sap-inbound run
//!   sap-inbound once
//!   sap-inbound config
//!   sap-inbound oc <file name>

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use sap_inbound::api::PurchaseOrder;
use sap_inbound::apps::{run_forever, DeliveryProcessor};
use sap_inbound::config::Config;
use sap_inbound::{logging, sap};

#[derive(Parser)]
#[command(name = "sap-inbound")]
#[command(about = "Loads inbound delivery spreadsheets into SAP")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process pending files every poll interval
    Run,
    /// Process pending files once and exit
    Once,
    /// Print the resolved configuration
    Config,
    /// Print the purchase order found in a file name
    Oc {
        /// Spreadsheet file name
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => {
            start(&config)?;
            run_forever(&config)?;
        },
        Commands::Once => {
            start(&config)?;

            let summary = DeliveryProcessor::new(&config).run_cycle(sap::open_session)?;
            info!(
                "{} pending: {} loaded, {} failed, {} skipped",
                summary.pending, summary.loaded, summary.failed, summary.skipped
            );
        },
        Commands::Config => {
            println!("{}", config);
        },
        Commands::Oc { name } => {
            let stem = Path::new(&name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name);

            match PurchaseOrder::from_file_stem(&stem) {
                Some(po) => println!("{}", po),
                None => println!("no purchase order in `{}`", stem),
            }
        },
    }

    Ok(())
}

/// Log to `Logs/` and make sure the bot can log in
fn start(config: &Config) -> anyhow::Result<()> {
    let log_file = logging::init(Some(&config.layout().logs()))?;
    config.validate()?;

    info!("SAP {} bot started", config.environment);
    if let Some(path) = log_file {
        info!("logging to {}", path.display());
    }

    Ok(())
}
