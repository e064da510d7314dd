//! Sluice CLI
//!
//! Runs pipelines locally and inspects the monitor.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use sluice_runner::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice pipeline runner", long_about = None)]
struct Cli {
    /// Monitor URL; pass an empty string to run without reporting
    #[arg(long, env = "MONITOR_URL")]
    monitor_url: Option<String>,

    /// Directory containing <name>.pipeline.yaml definitions
    #[arg(long, env = "PIPELINES_DIR")]
    pipelines_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_runner=info,sluice_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = &cli.monitor_url {
        config = config.with_monitor_url(url);
    }
    if let Some(dir) = cli.pipelines_dir {
        config = config.with_pipelines_dir(dir);
    }
    config.validate()?;

    handle_command(cli.command, &config).await
}
