mod sentiment;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "moodring")]
#[command(about = "Crypto market sentiment tracker")]
struct Cli {
    /// Override the sources file (defaults to MOODRING_SOURCES_PATH)
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    /// Override the history file (defaults to MOODRING_HISTORY_PATH)
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every configured source once and record the aggregate
    Collect {
        /// List the configured sources without fetching anything
        #[arg(long)]
        dry_run: bool,

        /// Print the export row as a JSON array after collecting
        #[arg(long)]
        emit_row: bool,
    },
    /// Show the most recent aggregate snapshots
    Status {
        /// Number of snapshots to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Generate a markdown trend and correlation report from the history
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = moodring_core::load_app_config()?;
    if let Some(path) = cli.sources {
        config.sources_path = path;
    }
    if let Some(path) = cli.history {
        config.history_path = path;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(env = %config.env, sources = %config.sources_path.display(), "configuration loaded");

    match cli.command {
        Some(Commands::Collect { dry_run, emit_row }) => {
            sentiment::run_collect(&config, dry_run, emit_row).await?;
        }
        Some(Commands::Status { limit }) => sentiment::run_status(&config, limit)?,
        Some(Commands::Report) => sentiment::run_report(&config)?,
        None => println!("moodring: no command given; try `moodring collect` or `moodring --help`"),
    }

    Ok(())
}
