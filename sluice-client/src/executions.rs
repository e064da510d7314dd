//! Execution-related API endpoints

use crate::MonitorClient;
use crate::error::Result;
use sluice_core::domain::execution::PipelineExecution;
use sluice_core::dto::execution::{
    Ack, ExecutionList, ExecutionStarted, StartExecution, UpdateExecution, UpdateStep,
};

impl MonitorClient {
    /// Register a new execution with the monitor
    ///
    /// # Returns
    /// The id the monitor allocated for the execution
    pub async fn start_execution(&self, req: &StartExecution) -> Result<ExecutionStarted> {
        let url = format!("{}/api/start", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Update the status, result or error of an execution
    pub async fn update_execution(&self, req: &UpdateExecution) -> Result<()> {
        let url = format!("{}/api/update", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response::<Ack>(response).await.map(|_| ())
    }

    /// Update the status, output or error of a single step
    pub async fn update_step(&self, req: &UpdateStep) -> Result<()> {
        let url = format!("{}/api/step", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response::<Ack>(response).await.map(|_| ())
    }

    /// List every execution the monitor knows about
    pub async fn list_executions(&self) -> Result<Vec<PipelineExecution>> {
        let url = format!("{}/api/executions", self.base_url);
        let response = self.client.get(&url).send().await?;

        let list: ExecutionList = self.handle_response(response).await?;
        Ok(list.executions)
    }
}
