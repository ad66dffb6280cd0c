//! linkledger: harvest links from web pages into a deduplicated record table

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkledger::config::{Config, LogFormat, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "linkledger")]
#[command(about = "Harvest links from web pages into a deduplicated record table")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "linkledger.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Extract links from the configured sources
    Extract {
        /// Only run these sources (repeatable); all sources when omitted
        #[arg(short, long = "source")]
        sources: Vec<String>,
    },

    /// Print the record table
    List {
        /// Only records from this source
        #[arg(short, long)]
        source: Option<String>,

        /// Include archived records
        #[arg(short, long)]
        all: bool,
    },

    /// Run the HTTP API until Ctrl-C
    Serve {
        /// Listen address (overrides http.listen_addr)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Mirror the table to or from the remote gist
    Sync {
        #[command(subcommand)]
        direction: SyncDirection,
    },
}

#[derive(Subcommand)]
enum SyncDirection {
    /// Upload the local table
    Push,
    /// Replace the local table with the remote copy
    Pull {
        /// Overwrite even when the remote table has fewer records or a lower
        /// highest id than the local one
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = logging.level.raised(verbose);
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false);

    match logging.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file '{}' not found (run `linkledger init` to create one)",
            path.display()
        );
    }
    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init { path } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            return commands::init::init_config(&path).await;
        }
        other => other,
    };

    let config = load_config(&cli.config)?;
    init_logging(&config.logging, cli.verbose)?;

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Extract { sources } => commands::extract::run_extraction(config, sources).await,
        Commands::List { source, all } => commands::list::list_records(&config, source.as_deref(), all),
        Commands::Serve { listen } => commands::serve::serve(config, listen).await,
        Commands::Sync { direction } => match direction {
            SyncDirection::Push => commands::sync::push(&config).await,
            SyncDirection::Pull { force } => commands::sync::pull(&config, force).await,
        },
    }
}
