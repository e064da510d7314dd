//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod actions;
mod executions;
mod pipelines;
mod run;

use anyhow::Result;
use clap::Subcommand;
use serde_json::Value as JsonValue;
use sluice_runner::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a pipeline and print its outcome
    Run {
        /// Pipeline name (file stem of <name>.pipeline.yaml)
        pipeline: String,

        /// Initial input as a JSON object
        #[arg(long, default_value = "{}")]
        input: String,

        /// Label identifying who runs the pipeline
        #[arg(long, default_value = "sluice-cli")]
        agent: String,

        /// Extra input field as key=value; the value is parsed as JSON when possible
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = run::parse_assignment)]
        set: Vec<(String, JsonValue)>,
    },
    /// Run several pipelines side by side with staggered starts
    Demo {
        /// Pause after each step, in milliseconds
        #[arg(long, default_value_t = 200)]
        step_delay_ms: u64,
    },
    /// List registered actions
    Actions,
    /// List pipeline definitions in the pipelines directory
    Pipelines,
    /// List executions known to the monitor
    Executions,
}

/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            pipeline,
            input,
            agent,
            set,
        } => run::run_pipeline(config, &pipeline, &input, &agent, set).await,
        Commands::Demo { step_delay_ms } => run::run_demo(config, step_delay_ms).await,
        Commands::Actions => actions::list_actions(),
        Commands::Pipelines => pipelines::list_pipelines(config),
        Commands::Executions => executions::list_executions(config).await,
    }
}
