//! Progress reporting
//!
//! The engine announces lifecycle transitions through a `Reporter`. Reporting
//! is observational only: implementations never return errors, and the engine
//! behaves identically whether or not anything is listening.
//!
//! `HttpReporter` forwards to the monitor's control API. Every call is bounded
//! by the client timeout and every failure (refused connection, timeout,
//! non-success status) is swallowed here, logged, and counted.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sluice_core::domain::definition::StepSummary;
use sluice_core::domain::execution::ExecutionStatus;
use sluice_core::dto::execution::{StartExecution, UpdateExecution, UpdateStep};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::MonitorClient;
use crate::error::{ClientError, Result};

/// Sink for pipeline lifecycle notifications
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Announces a new run; returns the monitor's execution id if it accepted it
    async fn start(&self, agent: &str, pipeline: &str, steps: &[StepSummary]) -> Option<Uuid>;

    /// Announces a pipeline-level status change
    async fn pipeline(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    );

    /// Announces a step-level status change
    async fn step(
        &self,
        execution_id: Uuid,
        step_id: &str,
        status: ExecutionStatus,
        output: Option<JsonValue>,
        error: Option<String>,
    );
}

/// Reporter used when no monitor is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledReporter;

#[async_trait]
impl Reporter for DisabledReporter {
    async fn start(&self, _agent: &str, _pipeline: &str, _steps: &[StepSummary]) -> Option<Uuid> {
        None
    }

    async fn pipeline(
        &self,
        _execution_id: Uuid,
        _status: ExecutionStatus,
        _result: Option<JsonValue>,
        _error: Option<String>,
    ) {
    }

    async fn step(
        &self,
        _execution_id: Uuid,
        _step_id: &str,
        _status: ExecutionStatus,
        _output: Option<JsonValue>,
        _error: Option<String>,
    ) {
    }
}

/// Fire-and-forget reporter backed by the monitor's HTTP API
#[derive(Debug)]
pub struct HttpReporter {
    client: MonitorClient,
    failures: AtomicU64,
}

impl HttpReporter {
    /// Creates a reporter whose calls each give up after `timeout`
    pub fn new(monitor_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(MonitorClient::with_timeout(
            monitor_url,
            timeout,
        )?))
    }

    pub fn with_client(client: MonitorClient) -> Self {
        Self {
            client,
            failures: AtomicU64::new(0),
        }
    }

    /// How many notifications failed and were suppressed
    pub fn suppressed_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Swallows a failed notification
    ///
    /// The first failure is a warning so a missing monitor is noticed once;
    /// later ones are debug noise.
    fn suppress(&self, what: &str, err: ClientError) {
        let previous = self.failures.fetch_add(1, Ordering::Relaxed);
        if previous == 0 {
            let reason = if err.is_unreachable() {
                "is unreachable"
            } else if err.is_not_found() {
                "does not know this execution"
            } else {
                "rejected a notification"
            };
            warn!(
                "Monitor at {} {}, continuing without it ({}: {})",
                self.client.base_url(),
                reason,
                what,
                err
            );
        } else {
            debug!("Suppressed monitor failure ({}: {})", what, err);
        }
    }
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn start(&self, agent: &str, pipeline: &str, steps: &[StepSummary]) -> Option<Uuid> {
        let req = StartExecution {
            agent: agent.to_string(),
            pipeline: pipeline.to_string(),
            steps: steps.to_vec(),
        };

        match self.client.start_execution(&req).await {
            Ok(started) => Some(started.id),
            Err(e) => {
                self.suppress("start", e);
                None
            }
        }
    }

    async fn pipeline(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) {
        let req = UpdateExecution {
            id: execution_id,
            status,
            result,
            error,
            current_step: None,
        };

        if let Err(e) = self.client.update_execution(&req).await {
            self.suppress("update", e);
        }
    }

    async fn step(
        &self,
        execution_id: Uuid,
        step_id: &str,
        status: ExecutionStatus,
        output: Option<JsonValue>,
        error: Option<String>,
    ) {
        let req = UpdateStep {
            execution_id,
            step_id: step_id.to_string(),
            status,
            output,
            error,
        };

        if let Err(e) = self.client.update_step(&req).await {
            self.suppress("step", e);
        }
    }
}
