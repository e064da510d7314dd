//! Execution Store
//!
//! In-memory registry of every pipeline execution reported to this monitor.
//! All mutations and observer registration go through one async mutex, and each
//! mutation broadcasts its event before the lock is released, so observers see
//! events in exactly the order the mutations were applied.

use chrono::Utc;
use sluice_core::domain::definition::StepSummary;
use sluice_core::domain::execution::{
    ExecutionStatus, InvalidTransition, PipelineExecution, StepExecution,
};
use sluice_core::dto::execution::{UpdateExecution, UpdateStep};
use sluice_core::event::BroadcastEvent;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::service::hub::{BroadcastHub, EventReceiver, ObserverId};

/// Service error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Execution {0} not found")]
    ExecutionNotFound(Uuid),

    #[error("Step '{step_id}' not found in execution {execution_id}")]
    StepNotFound { execution_id: Uuid, step_id: String },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A registered observer: its handle and its event queue
///
/// The first queued event is always the `init` snapshot.
#[derive(Debug)]
pub struct Subscription {
    pub id: ObserverId,
    pub events: EventReceiver,
}

#[derive(Debug, Default)]
struct StoreState {
    executions: HashMap<Uuid, PipelineExecution>,
    order: Vec<Uuid>,
    hub: BroadcastHub,
}

impl StoreState {
    fn snapshot(&self) -> Vec<PipelineExecution> {
        self.order
            .iter()
            .filter_map(|id| self.executions.get(id).cloned())
            .collect()
    }

    fn allocate_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !self.executions.contains_key(&id) {
                return id;
            }
        }
    }
}

#[derive(Debug)]
pub struct ExecutionStore {
    state: Mutex<StoreState>,
}

impl ExecutionStore {
    /// Creates an empty store whose observers can each queue `observer_buffer` events
    pub fn new(observer_buffer: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                hub: BroadcastHub::new(observer_buffer),
                ..Default::default()
            }),
        }
    }

    /// Records a new `pending` execution and broadcasts `pipeline:start`
    pub async fn create_execution(
        &self,
        agent: &str,
        pipeline_name: &str,
        steps: &[StepSummary],
    ) -> PipelineExecution {
        let mut state = self.state.lock().await;

        let id = state.allocate_id();
        let execution = PipelineExecution::new(id, agent, pipeline_name, steps, Utc::now());

        state.executions.insert(id, execution.clone());
        state.order.push(id);
        state
            .hub
            .publish(BroadcastEvent::pipeline_start(execution.clone()));

        info!(
            "Execution {} created: pipeline '{}' for agent '{}' ({} steps)",
            id,
            pipeline_name,
            agent,
            steps.len()
        );

        execution
    }

    /// Applies a pipeline-level update and broadcasts `pipeline:update`
    pub async fn update_execution(&self, req: UpdateExecution) -> Result<PipelineExecution> {
        let mut state = self.state.lock().await;

        let Some(execution) = state.executions.get_mut(&req.id) else {
            warn!("Ignoring update for unknown execution {}", req.id);
            return Err(StoreError::ExecutionNotFound(req.id));
        };

        execution
            .apply_update(req.status, req.result, req.error, Utc::now())
            .inspect_err(|e| warn!("Rejected update for execution {}: {}", req.id, e))?;
        if let Some(step) = req.current_step {
            execution.current_step = Some(step);
        }

        let updated = execution.clone();
        state
            .hub
            .publish(BroadcastEvent::pipeline_update(updated.clone()));

        debug!("Execution {} is now {}", updated.id, updated.status);

        Ok(updated)
    }

    /// Applies a step update and broadcasts `step:<status>`
    pub async fn update_step(&self, req: UpdateStep) -> Result<StepExecution> {
        let mut state = self.state.lock().await;

        let Some(execution) = state.executions.get_mut(&req.execution_id) else {
            warn!(
                "Ignoring step '{}' update for unknown execution {}",
                req.step_id, req.execution_id
            );
            return Err(StoreError::ExecutionNotFound(req.execution_id));
        };

        let Some(step) = execution.step_mut(&req.step_id) else {
            warn!(
                "Ignoring update for unknown step '{}' in execution {}",
                req.step_id, req.execution_id
            );
            return Err(StoreError::StepNotFound {
                execution_id: req.execution_id,
                step_id: req.step_id,
            });
        };

        step.apply_update(req.status, req.output, req.error, Utc::now())
            .inspect_err(|e| {
                warn!(
                    "Rejected update for step '{}' in execution {}: {}",
                    req.step_id, req.execution_id, e
                )
            })?;

        let updated = step.clone();
        if updated.status == ExecutionStatus::Running {
            execution.current_step = Some(updated.id.clone());
        }

        state
            .hub
            .publish(BroadcastEvent::step(req.execution_id, updated.clone()));

        debug!(
            "Step '{}' of execution {} is now {}",
            updated.id, req.execution_id, updated.status
        );

        Ok(updated)
    }

    /// All executions in creation order
    pub async fn snapshot(&self) -> Vec<PipelineExecution> {
        self.state.lock().await.snapshot()
    }

    /// Registers an observer whose first event is the current snapshot
    pub async fn subscribe(&self) -> Subscription {
        let mut state = self.state.lock().await;
        let init = BroadcastEvent::init(state.snapshot());
        let (id, events) = state.hub.register(init);
        Subscription { id, events }
    }

    /// Removes an observer
    pub async fn unsubscribe(&self, id: ObserverId) {
        self.state.lock().await.hub.remove(id);
    }

    pub async fn observer_count(&self) -> usize {
        self.state.lock().await.hub.observer_count()
    }
}

impl Default for ExecutionStore {
    fn default() -> Self {
        Self::new(256)
    }
}
