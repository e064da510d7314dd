//! Health Check API Handler
//!
//! Liveness endpoint that also reports how much the monitor is tracking.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::SharedStore;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub executions: usize,
    pub observers: usize,
}

/// GET /health
pub async fn health_check(State(store): State<SharedStore>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        executions: store.snapshot().await.len(),
        observers: store.observer_count().await,
    })
}
