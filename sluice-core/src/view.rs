//! Observer-side view of executions
//!
//! Rebuilds the monitor's state purely from the observation stream: `init`
//! replaces everything, `pipeline:*` replaces one execution, `step:*` merges
//! one step into its execution. Events for unknown executions or steps are
//! ignored; a gap can only be repaired by reconnecting and taking a new `init`.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::execution::{ExecutionStatus, PipelineExecution};
use crate::event::{BroadcastEvent, EventData, INIT, PIPELINE_PREFIX, STEP_PREFIX};

#[derive(Debug, Clone, Default)]
pub struct ExecutionView {
    executions: HashMap<Uuid, PipelineExecution>,
    order: Vec<Uuid>,
}

impl ExecutionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event, returning whether it changed the view
    pub fn apply(&mut self, event: &BroadcastEvent) -> bool {
        match &event.data {
            EventData::Snapshot(list) if event.event == INIT => {
                self.executions.clear();
                self.order.clear();
                for exec in &list.executions {
                    self.upsert(exec.clone());
                }
                true
            }
            EventData::Execution(exec) if event.event.starts_with(PIPELINE_PREFIX) => {
                self.upsert(exec.as_ref().clone());
                true
            }
            EventData::Step(step_event) if event.event.starts_with(STEP_PREFIX) => {
                let Some(exec) = self.executions.get_mut(&step_event.execution_id) else {
                    return false;
                };
                match exec.step_mut(&step_event.step.id) {
                    Some(step) => {
                        *step = step_event.step.clone();
                        if step_event.step.status == ExecutionStatus::Running {
                            exec.current_step = Some(step_event.step.id.clone());
                        }
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&PipelineExecution> {
        self.executions.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Executions in first-seen order
    pub fn executions(&self) -> Vec<PipelineExecution> {
        self.order
            .iter()
            .filter_map(|id| self.executions.get(id).cloned())
            .collect()
    }

    fn upsert(&mut self, exec: PipelineExecution) {
        if self.executions.insert(exec.id, exec.clone()).is_none() {
            self.order.push(exec.id);
        }
    }
}
