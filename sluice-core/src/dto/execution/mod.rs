//! Execution DTOs for the control API

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::definition::StepSummary;
use crate::domain::execution::{ExecutionStatus, PipelineExecution};

/// `POST /api/start` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartExecution {
    #[serde(default = "unknown_agent")]
    pub agent: String,
    pub pipeline: String,
    #[serde(default)]
    pub steps: Vec<StepSummary>,
}

fn unknown_agent() -> String {
    "unknown".to_string()
}

/// `POST /api/start` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStarted {
    pub id: Uuid,
}

/// `POST /api/update` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecution {
    pub id: Uuid,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

/// `POST /api/step` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStep {
    pub execution_id: Uuid,
    pub step_id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledgement returned by the update endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Every execution currently known to the monitor
///
/// Served by `GET /api/executions` and carried by the `init` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionList {
    pub executions: Vec<PipelineExecution>,
}
