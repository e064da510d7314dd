//! Execution domain types
//!
//! A `PipelineExecution` is the run-time record of one pipeline run as seen by
//! the monitor. Statuses only move forward: `pending → running → {completed|failed}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::definition::StepSummary;

/// Lifecycle status shared by pipeline and step executions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of a legal status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status moved forward
    Advanced,
    /// The requested status equals the current one
    Unchanged,
}

/// Rejected backward or out-of-terminal status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are sticky
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            ExecutionStatus::Pending => 0,
            ExecutionStatus::Running => 1,
            ExecutionStatus::Completed | ExecutionStatus::Failed => 2,
        }
    }

    /// Checks whether `self → next` is allowed
    pub fn transition_to(self, next: ExecutionStatus) -> Result<Transition, InvalidTransition> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        if self.is_terminal() || next.rank() <= self.rank() {
            return Err(InvalidTransition {
                from: self,
                to: next,
            });
        }
        Ok(Transition::Advanced)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-time record of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineExecution {
    pub id: Uuid,
    pub agent: String,
    pub pipeline_name: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub steps: Vec<StepExecution>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run-time record of one step within a pipeline execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub id: String,
    pub action: String,
    pub status: ExecutionStatus,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineExecution {
    /// Creates a `pending` execution with every step `pending`
    pub fn new(
        id: Uuid,
        agent: impl Into<String>,
        pipeline_name: impl Into<String>,
        steps: &[StepSummary],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            agent: agent.into(),
            pipeline_name: pipeline_name.into(),
            status: ExecutionStatus::Pending,
            current_step: None,
            steps: steps.iter().map(StepExecution::pending).collect(),
            start_time: now,
            end_time: None,
            result: None,
            error: None,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&StepExecution> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut StepExecution> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    /// Applies a pipeline-level status update
    ///
    /// Repeating the current terminal status leaves the record untouched, so a
    /// retried request cannot rewrite a finished run.
    pub fn apply_update(
        &mut self,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transition, InvalidTransition> {
        let transition = self.status.transition_to(status)?;
        if transition == Transition::Unchanged && status.is_terminal() {
            return Ok(transition);
        }

        self.status = status;
        if result.is_some() {
            self.result = result;
        }
        if error.is_some() {
            self.error = error;
        }
        if transition == Transition::Advanced && status.is_terminal() {
            self.end_time = Some(now);
        }

        Ok(transition)
    }
}

impl StepExecution {
    pub fn pending(summary: &StepSummary) -> Self {
        Self {
            id: summary.id.clone(),
            action: summary.action.clone(),
            status: ExecutionStatus::Pending,
            start_time: None,
            end_time: None,
            output: None,
            error: None,
        }
    }

    /// Applies a step status update, stamping start/end times on entry
    pub fn apply_update(
        &mut self,
        status: ExecutionStatus,
        output: Option<JsonValue>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transition, InvalidTransition> {
        let transition = self.status.transition_to(status)?;
        if transition == Transition::Unchanged && status.is_terminal() {
            return Ok(transition);
        }

        self.status = status;
        if transition == Transition::Advanced {
            match status {
                ExecutionStatus::Running => self.start_time = Some(now),
                ExecutionStatus::Completed | ExecutionStatus::Failed => self.end_time = Some(now),
                ExecutionStatus::Pending => {}
            }
        }
        if output.is_some() {
            self.output = output;
        }
        if error.is_some() {
            self.error = error;
        }

        Ok(transition)
    }
}
