//! imprep CLI - normalize training image corpora and find near-duplicates.
//!
//! # Usage
//!
//! ```bash
//! # Border, crop box, color class and fingerprint for every image
//! imprep scan ./corpus/ --output records.jsonl --format jsonl
//!
//! # Near-duplicate groups
//! imprep dupes ./corpus/ --max-distance 4
//!
//! # Ranked matches for one image
//! imprep query ./new/scan-12.png ./corpus/
//!
//! # View configuration
//! imprep config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// imprep - normalize training image corpora and report near-duplicates.
#[derive(Parser, Debug)]
#[command(name = "imprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "IMPREP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Report mode, border, crop box, color class and fingerprint per image
    Scan(cli::scan::ScanArgs),

    /// Group near-duplicate images in a corpus
    Dupes(cli::dupes::DupesArgs),

    /// Find the corpus images closest to one image
    Query(cli::query::QueryArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(imprep_core::Config::default_path);

    // Logging isn't initialized yet, so use eprintln for config warnings.
    // An explicitly named file must load; the default location may be absent or stale.
    let config = if cli.config.is_some() {
        imprep_core::Config::load_from(&config_path)?
    } else if config_path.exists() {
        match imprep_core::Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `imprep config path`."
                );
                imprep_core::Config::default()
            }
        }
    } else {
        imprep_core::Config::default()
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("imprep v{}", imprep_core::VERSION);

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processing.parallel_workers)
        .build_global()
    {
        tracing::warn!("Could not size the worker pool: {e}");
    }

    match cli.command {
        Commands::Scan(args) => cli::scan::execute(args, &config).await,
        Commands::Dupes(args) => cli::dupes::execute(args, &config).await,
        Commands::Query(args) => cli::query::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}
