use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creator_scout::config::Config;

mod commands;

use commands::RunOptions;

#[derive(Parser)]
#[command(
    name = "creator-scout",
    version,
    about = "Find short-video creators by keyword, enrich their profiles and estimate a price",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (SCOUT_* environment variables still apply on top)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one or more keywords and export the creators found
    Search {
        /// Comma separated keywords, searched one after another
        #[arg(short, long, value_delimiter = ',', required = true)]
        keywords: Vec<String>,

        /// Creators to collect per keyword
        #[arg(short, long)]
        target: Option<usize>,

        /// Score from search results only, without profile and video lookups
        #[arg(long, default_value = "false")]
        skip_enrich: bool,

        /// Output directory for tables, reports and checkpoints
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write Prometheus metrics here when finished
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Continue a search from a checkpoint file
    Resume {
        /// Checkpoint file path
        checkpoint: PathBuf,

        /// Creators to collect
        #[arg(short, long)]
        target: Option<usize>,

        /// Score from search results only, without profile and video lookups
        #[arg(long, default_value = "false")]
        skip_enrich: bool,

        /// Output directory for tables, reports and checkpoints
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write Prometheus metrics here when finished
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "creator-scout failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let output = match &cli.command {
        Commands::Search { output, .. } | Commands::Resume { output, .. } => output.clone(),
    };
    let config = load_config(cli.config.as_deref(), output)?;

    let format = cli.log_format.as_deref().unwrap_or(config.logging.format.as_str());
    setup_tracing(format, &config.logging.level, cli.verbose)?;

    tracing::info!("creator-scout starting");

    let reports = match cli.command {
        Commands::Search {
            keywords,
            target,
            skip_enrich,
            metrics_file,
            ..
        } => {
            tracing::info!(
                keywords = ?keywords,
                target = ?target,
                skip_enrich = %skip_enrich,
                "Starting search command"
            );
            let options = RunOptions {
                target,
                skip_enrich,
                metrics_file,
            };
            commands::search(config, keywords, options).await?
        }

        Commands::Resume {
            checkpoint,
            target,
            skip_enrich,
            metrics_file,
            ..
        } => {
            tracing::info!(
                checkpoint = %checkpoint.display(),
                target = ?target,
                "Starting resume command"
            );
            let options = RunOptions {
                target,
                skip_enrich,
                metrics_file,
            };
            commands::resume(config, checkpoint, options).await?
        }
    };

    tracing::info!("creator-scout completed");
    Ok(commands::exit_code(&reports))
}

fn load_config(path: Option<&Path>, output: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path).context("Failed to load configuration")?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(dir) = output {
        config.output.dir = dir;
    }
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("creator_scout=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("creator_scout={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
