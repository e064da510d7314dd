//! Broadcast events pushed to observers
//!
//! Every message on the observation channel is a `BroadcastEvent`:
//! `{ event, data, timestamp }`. The first message after connecting is always
//! `init` carrying the full snapshot; later messages carry either a whole
//! execution (`pipeline:*`) or a single step tagged with its execution id
//! (`step:*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::execution::{PipelineExecution, StepExecution};
use crate::dto::execution::ExecutionList;

pub const INIT: &str = "init";
pub const PIPELINE_START: &str = "pipeline:start";
pub const PIPELINE_UPDATE: &str = "pipeline:update";
pub const PIPELINE_PREFIX: &str = "pipeline:";
pub const STEP_PREFIX: &str = "step:";

/// Envelope of every observer message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event: String,
    pub data: EventData,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Payload of a broadcast event
///
/// Variants are distinguished by shape: a snapshot has `executions`, a step
/// carries `executionId`, anything else is a full execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    Snapshot(ExecutionList),
    Step(StepEvent),
    Execution(Box<PipelineExecution>),
}

/// A step record together with the execution it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEvent {
    pub execution_id: Uuid,
    #[serde(flatten)]
    pub step: StepExecution,
}

impl BroadcastEvent {
    fn new(event: impl Into<String>, data: EventData) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Snapshot sent once to every newly connected observer
    pub fn init(executions: Vec<PipelineExecution>) -> Self {
        Self::new(INIT, EventData::Snapshot(ExecutionList { executions }))
    }

    pub fn pipeline_start(execution: PipelineExecution) -> Self {
        Self::new(PIPELINE_START, EventData::Execution(Box::new(execution)))
    }

    pub fn pipeline_update(execution: PipelineExecution) -> Self {
        Self::new(PIPELINE_UPDATE, EventData::Execution(Box::new(execution)))
    }

    /// `step:<status>` for the step's current status
    pub fn step(execution_id: Uuid, step: StepExecution) -> Self {
        let event = format!("{}{}", STEP_PREFIX, step.status);
        Self::new(event, EventData::Step(StepEvent { execution_id, step }))
    }

    /// Serializes the event into a text frame
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::definition::StepSummary;
    use crate::domain::execution::ExecutionStatus;

    fn execution() -> PipelineExecution {
        PipelineExecution::new(
            Uuid::new_v4(),
            "agent",
            "chain",
            &[StepSummary {
                id: "a".to_string(),
                action: "math/double".to_string(),
            }],
            Utc::now(),
        )
    }

    #[test]
    fn test_step_event_name_follows_status() {
        let exec = execution();
        let mut step = exec.steps[0].clone();
        step.status = ExecutionStatus::Running;

        let event = BroadcastEvent::step(exec.id, step);
        assert_eq!(event.event, "step:running");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["executionId"], exec.id.to_string());
        assert_eq!(value["data"]["id"], "a");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_event_data_shapes_are_recovered() {
        let exec = execution();
        let events = vec![
            BroadcastEvent::init(vec![exec.clone()]),
            BroadcastEvent::pipeline_start(exec.clone()),
            BroadcastEvent::step(exec.id, exec.steps[0].clone()),
        ];

        for event in events {
            let text = event.to_json().unwrap();
            let parsed: BroadcastEvent = serde_json::from_str(&text).unwrap();
            match (&event.data, &parsed.data) {
                (EventData::Snapshot(_), EventData::Snapshot(_))
                | (EventData::Execution(_), EventData::Execution(_))
                | (EventData::Step(_), EventData::Step(_)) => {}
                (expected, got) => panic!("expected {expected:?}, got {got:?}"),
            }
        }
    }
}
