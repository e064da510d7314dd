//! Executions command handler
//!
//! Shows the monitor's current snapshot as a table.

use anyhow::Result;
use colored::*;
use sluice_client::MonitorClient;
use sluice_core::domain::execution::{ExecutionStatus, PipelineExecution};
use sluice_runner::Config;

pub async fn list_executions(config: &Config) -> Result<()> {
    let Some(url) = &config.monitor_url else {
        anyhow::bail!("No monitor configured; set --monitor-url or MONITOR_URL");
    };

    let client = MonitorClient::new(url.clone());
    let executions = client.list_executions().await?;

    if executions.is_empty() {
        println!("{}", "No executions found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} execution(s):", executions.len()).bold());
    println!();
    println!(
        "  {:<8}  {:<18}  {:<18}  {:<9}  {:>5}  {:>9}",
        "ID".bold(),
        "AGENT".bold(),
        "PIPELINE".bold(),
        "STATUS".bold(),
        "STEPS".bold(),
        "DURATION".bold()
    );
    for execution in &executions {
        print_execution_row(execution);
    }

    Ok(())
}

fn print_execution_row(execution: &PipelineExecution) {
    let id = execution.id.to_string();
    let done = execution
        .steps
        .iter()
        .filter(|s| s.status == ExecutionStatus::Completed)
        .count();

    println!(
        "  {:<8}  {:<18}  {:<18}  {:<9}  {:>5}  {:>9}",
        id[..8].dimmed(),
        truncate(&execution.agent, 18),
        truncate(&execution.pipeline_name, 18),
        colorize_status(execution.status),
        format!("{}/{}", done, execution.steps.len()),
        duration(execution)
    );

    if let Some(error) = &execution.error {
        println!("    {} {}", "└".dimmed(), error.red());
    }
}

fn duration(execution: &PipelineExecution) -> String {
    match execution.end_time {
        Some(end) => {
            let ms = end
                .signed_duration_since(execution.start_time)
                .num_milliseconds();
            format!("{:.1}s", ms as f64 / 1000.0)
        }
        None => "-".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

fn colorize_status(status: ExecutionStatus) -> ColoredString {
    match status {
        ExecutionStatus::Pending => status.as_str().yellow(),
        ExecutionStatus::Running => status.as_str().cyan(),
        ExecutionStatus::Completed => status.as_str().green(),
        ExecutionStatus::Failed => status.as_str().red(),
    }
}
