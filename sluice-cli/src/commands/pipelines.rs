use anyhow::{Context, Result};
use colored::*;
use sluice_runner::{Config, DirectorySource};

/// Prints the name of every definition `run` can load
pub fn list_pipelines(config: &Config) -> Result<()> {
    let source = DirectorySource::new(config.pipelines_dir.clone());
    let names = source.names().with_context(|| {
        format!(
            "Failed to read pipelines directory {}",
            config.pipelines_dir.display()
        )
    })?;

    if names.is_empty() {
        println!(
            "{}",
            format!("No pipelines in {}", config.pipelines_dir.display()).yellow()
        );
        return Ok(());
    }

    println!("{}", format!("{} pipeline(s):", names.len()).bold());
    println!();
    for name in names {
        println!("  {} {}", "▸".cyan(), name);
    }

    Ok(())
}
