//! Execution API Handlers
//!
//! Control endpoints called by runners to report pipeline progress, plus a
//! read-only listing of the current state.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sluice_core::dto::execution::{
    Ack, ExecutionList, ExecutionStarted, StartExecution, UpdateExecution, UpdateStep,
};
use uuid::Uuid;

use crate::api::SharedStore;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/start
/// Register a new execution; every step starts `pending`
pub async fn start_execution(
    State(store): State<SharedStore>,
    payload: Result<Json<StartExecution>, JsonRejection>,
) -> ApiResult<Json<ExecutionStarted>> {
    let Json(req) = payload?;

    if req.pipeline.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    tracing::debug!(
        "Starting execution of '{}' for agent '{}'",
        req.pipeline,
        req.agent
    );

    let execution = store
        .create_execution(&req.agent, &req.pipeline, &req.steps)
        .await;

    Ok(Json(ExecutionStarted { id: execution.id }))
}

/// POST /api/update
/// Update the status, result or error of an execution
pub async fn update_execution(
    State(store): State<SharedStore>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> ApiResult<Json<Ack>> {
    let Json(body) = payload?;
    let req: UpdateExecution = decode(body, "id")?;

    tracing::debug!("Updating execution {} to {}", req.id, req.status);

    store.update_execution(req).await?;

    Ok(Json(Ack::ok()))
}

/// POST /api/step
/// Update the status, output or error of one step
pub async fn update_step(
    State(store): State<SharedStore>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> ApiResult<Json<Ack>> {
    let Json(body) = payload?;
    let req: UpdateStep = decode(body, "executionId")?;

    tracing::debug!(
        "Updating step '{}' of execution {} to {}",
        req.step_id,
        req.execution_id,
        req.status
    );

    store.update_step(req).await?;

    Ok(Json(Ack::ok()))
}

/// GET /api/executions
/// List every known execution in creation order
pub async fn list_executions(State(store): State<SharedStore>) -> Json<ExecutionList> {
    Json(ExecutionList {
        executions: store.snapshot().await,
    })
}

/// Decodes an update body
///
/// An id that is not a UUID cannot name any execution, so it is a 404 like
/// any other unknown id. Every other shape problem is a 400.
fn decode<T: DeserializeOwned>(body: JsonValue, id_field: &str) -> ApiResult<T> {
    if let Some(id) = body.get(id_field).and_then(JsonValue::as_str)
        && Uuid::parse_str(id).is_err()
    {
        tracing::warn!("Ignoring update for unknown execution {}", id);
        return Err(ApiError::NotFound(format!("Execution {} not found", id)));
    }

    serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}
