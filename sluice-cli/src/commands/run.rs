//! Run and demo command handlers

use anyhow::{Context, Result};
use colored::*;
use serde_json::{Map, Value as JsonValue, json};
use sluice_runner::{Config, Engine, RunOutcome};
use std::sync::Arc;
use std::time::Duration;

/// Delay between demo run starts
const DEMO_STAGGER: Duration = Duration::from_millis(300);

/// Parses `key=value`; the value is JSON if it parses as JSON, a string otherwise
pub fn parse_assignment(raw: &str) -> Result<(String, JsonValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| JsonValue::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Builds the initial input from `--input` and any `--set` assignments
fn build_input(raw: &str, assignments: Vec<(String, JsonValue)>) -> Result<JsonValue> {
    let input: JsonValue = serde_json::from_str(raw).context("--input must be valid JSON")?;

    if assignments.is_empty() {
        return Ok(input);
    }

    let mut fields = match input {
        JsonValue::Object(fields) => fields,
        JsonValue::Null => Map::new(),
        _ => anyhow::bail!("--set can only be combined with an object --input"),
    };
    fields.extend(assignments);
    Ok(JsonValue::Object(fields))
}

pub async fn run_pipeline(
    config: &Config,
    pipeline: &str,
    raw_input: &str,
    agent: &str,
    assignments: Vec<(String, JsonValue)>,
) -> Result<()> {
    let input = build_input(raw_input, assignments)?;
    let engine = Engine::from_config(config)?;

    let outcome = engine.run(pipeline, input, agent).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        anyhow::bail!("Pipeline {} failed", pipeline);
    }
    Ok(())
}

struct DemoJob {
    agent: &'static str,
    pipeline: &'static str,
    input: JsonValue,
}

fn demo_jobs() -> Vec<DemoJob> {
    vec![
        DemoJob {
            agent: "Calculator-1",
            pipeline: "math-chain",
            input: json!({ "value": 3 }),
        },
        DemoJob {
            agent: "Reporter-1",
            pipeline: "content-report",
            input: json!({
                "title": "Quarterly Infrastructure Review",
                "text": "Pipeline orchestration matured this quarter. Runs report progress \
                         to a live monitor and observers reconnect from a snapshot."
            }),
        },
        DemoJob {
            agent: "Calculator-2",
            pipeline: "math-chain",
            input: json!({ "value": 12 }),
        },
        DemoJob {
            agent: "Reporter-2",
            pipeline: "content-report",
            input: json!({
                "title": "Security Audit Summary",
                "text": "No critical findings. Control endpoints are trusted-network only."
            }),
        },
        // Fails input validation on its first step
        DemoJob {
            agent: "Calculator-3",
            pipeline: "math-chain",
            input: json!({ "value": "seven" }),
        },
    ]
}

pub async fn run_demo(config: &Config, step_delay_ms: u64) -> Result<()> {
    let mut config = config.clone();
    config.step_delay = Duration::from_millis(step_delay_ms);
    let engine = Arc::new(Engine::from_config(&config)?);

    match &config.monitor_url {
        Some(url) => println!("{} {}", "Reporting to".bold(), url.cyan()),
        None => println!("{}", "Reporting disabled".yellow()),
    }
    println!();

    let jobs = demo_jobs();
    let mut handles = Vec::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        let engine = Arc::clone(&engine);
        let pipeline = job.pipeline;
        let agent = job.agent;
        let input = job.input.clone();
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(DEMO_STAGGER * i as u32).await;
            engine.run(pipeline, input, agent).await
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await.unwrap_or_else(|e| RunOutcome {
            success: false,
            result: None,
            error: Some(format!("run task failed: {}", e)),
        });
        outcomes.push(outcome);
    }

    println!();
    println!("{}", "=== Demo Results ===".bold());
    for (job, outcome) in jobs.iter().zip(&outcomes) {
        if outcome.success {
            println!("  {} {} ({})", "✓".green(), job.agent, job.pipeline.dimmed());
        } else {
            println!(
                "  {} {} ({}): {}",
                "✗".red(),
                job.agent,
                job.pipeline.dimmed(),
                outcome.error.as_deref().unwrap_or("unknown error").red()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("value=3").unwrap(), ("value".to_string(), json!(3)));
        assert_eq!(
            parse_assignment("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".to_string(), json!(["a", "b"]))
        );
        assert_eq!(
            parse_assignment("title=Hello world").unwrap(),
            ("title".to_string(), json!("Hello world"))
        );
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".to_string(), json!("a=b"))
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_build_input_merges_assignments() {
        let input = build_input(
            r#"{"value": 1, "keep": true}"#,
            vec![("value".to_string(), json!(5))],
        )
        .unwrap();
        assert_eq!(input, json!({ "value": 5, "keep": true }));

        assert_eq!(build_input("[1]", vec![]).unwrap(), json!([1]));
        assert!(build_input("[1]", vec![("a".to_string(), json!(1))]).is_err());
        assert!(build_input("{not json", vec![]).is_err());
    }
}
