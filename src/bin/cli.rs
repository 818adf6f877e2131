//! Rulings crawler CLI
//!
//! Local and cron execution entry point.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rulings_crawler::{
    config,
    error::Result,
    mail::LogMailer,
    models::SourceKind,
    pipeline::{run_digest, run_pipeline},
    storage::BackupStore,
    utils::date::CutoffWindow,
};

/// Daily tax-rulings crawler
#[derive(Parser, Debug)]
#[command(name = "rulings-crawler", version, about = "Crawls tax ruling publishers and commits new records to a sheet")]
struct Cli {
    /// Path to config.toml (default: ./config.toml, falling back to
    /// built-in defaults when absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline across the enabled sources
    Run,

    /// Validate configuration and credentials without crawling
    Validate,

    /// Re-compose and log the digest for a run date
    Digest {
        /// Run date (YYYY-MM-DD); defaults to the current run window
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn enabled_sources(config: &rulings_crawler::models::Config) -> Vec<SourceKind> {
    let mut sources = Vec::new();
    if config.sources.rulings {
        sources.push(SourceKind::Rulings);
    }
    if config.sources.updates {
        sources.push(SourceKind::Updates);
    }
    sources
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run => {
            let (config, credentials) = config::load(cli.config.as_deref())?;
            let summary = run_pipeline(&config, &credentials).await?;
            let code = summary.exit_code();
            if code != 0 {
                log::error!("run committed nothing and at least one source failed");
                std::process::exit(code);
            }
        }
        Command::Validate => {
            config::load(cli.config.as_deref())?;
            log::info!("configuration and credentials look valid");
        }
        Command::Digest { date } => {
            let config = config::load_config_only(cli.config.as_deref())?;
            let run_date =
                date.unwrap_or_else(|| CutoffWindow::for_run_date(Local::now().date_naive()).end);
            let backup = BackupStore::new(&config.output);
            run_digest(
                &enabled_sources(&config),
                run_date,
                &backup,
                &config.mail,
                &LogMailer,
            )
            .await;
        }
    }

    Ok(())
}
