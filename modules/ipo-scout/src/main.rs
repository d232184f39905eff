use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipo_common::ScoutConfig;
use ipo_scout::{Pipeline, Scheduler};

#[derive(Parser)]
#[command(name = "scout", about = "Collects Indian IPO news and posts a digest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit.
    Run {
        /// Print the digest instead of posting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the pipeline repeatedly on a fixed interval.
    Watch {
        /// Hours between runs (overrides SCOUT_INTERVAL_HOURS).
        #[arg(long)]
        interval_hours: Option<u64>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = ScoutConfig::from_env().context("Failed to load scout configuration")?;
    config.log_redacted();

    match cli.command {
        Command::Run { dry_run } => {
            let pipeline = Pipeline::from_config(&config, dry_run)?;
            let report = pipeline.run_once(Utc::now()).await?;
            info!(
                run_id = %report.run_id,
                ipos = report.ipos,
                delivery = ?report.delivery,
                "Done"
            );
        }
        Command::Watch {
            interval_hours,
            dry_run,
        } => {
            let hours = interval_hours.unwrap_or(config.interval_hours).max(1);
            let pipeline = Pipeline::from_config(&config, dry_run)?;
            Scheduler::new(pipeline, Duration::from_secs(hours * 3600))
                .run_forever()
                .await;
        }
    }

    Ok(())
}

/// Logs go to stderr so `--dry-run` output on stdout stays clean JSON.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("ipo_scout=info".parse()?);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
