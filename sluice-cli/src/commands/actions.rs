use anyhow::{Context, Result};
use colored::*;
use sluice_runner::actions::builtin_registry;

/// Prints every built-in action with its description
pub fn list_actions() -> Result<()> {
    let registry = builtin_registry().context("Failed to register built-in actions")?;

    println!("{}", format!("{} action(s):", registry.len()).bold());
    println!();
    for name in registry.names() {
        let description = registry
            .get(name)
            .map(|entry| entry.action().description().to_string())
            .unwrap_or_default();
        println!("  {} {:<18} {}", "▸".cyan(), name, description.dimmed());
    }

    Ok(())
}
