//! matrix-sync CLI
//!
//! Batch entry point: one invocation runs one snapshot synchronisation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use matrix_sync::{
    error::Result,
    models::Config,
    pipeline::{self, summarize},
    services::FeedFetcher,
    storage,
};

/// matrix-sync - NDW matrix sign snapshot loader
#[derive(Parser, Debug)]
#[command(name = "matrix-sync", version, about = "NDW matrix sign snapshot loader")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "matrix-sync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download, reconcile and load the sign snapshot
    Sync {
        /// Read the compressed feed from this file instead of downloading it
        #[arg(long)]
        input: Option<PathBuf>,

        /// Reconcile and report without touching the stored snapshot
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the stored snapshot
    Info,

    /// Validate configuration
    Validate,
}

/// Initialize logging from RUST_LOG, the verbosity flag or the config.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Sync { input, dry_run } => {
            config.validate()?;

            let fetcher = match input {
                Some(path) => FeedFetcher::from_file(path),
                None => FeedFetcher::remote(&config.feed)?,
            };

            let report = if dry_run {
                pipeline::run_sync(config, &fetcher, None).await?
            } else {
                let mut store = storage::open(&config.storage)?;
                pipeline::run_sync(config, &fetcher, Some(store.as_mut())).await?
            };

            report.log_summary();
        }

        Command::Info => {
            let store = storage::open(&config.storage)?;
            let signs = store.load_current().await?;

            log::info!("Storage: {}", store.location());
            if signs.is_empty() {
                log::info!("No snapshot found yet.");
                return Ok(());
            }

            log::info!("Signs in snapshot: {}", signs.len());
            let located = signs.iter().filter(|s| s.has_location()).count();
            log::info!("Signs with a location: {}", located);
            for (kind, count) in summarize(&signs) {
                log::info!("    {}: {}", kind, count);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK (feed {})", config.feed.url);
        }
    }

    Ok(())
}
