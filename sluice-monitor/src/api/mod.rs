//! API Module
//!
//! HTTP API layer for the monitor.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod execution;
pub mod health;
pub mod observe;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::ExecutionStore;

/// Store handle shared by all handlers
pub type SharedStore = Arc<ExecutionStore>;

/// Create the main API router with all endpoints
pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Control endpoints (runner → monitor)
        .route("/api/start", post(execution::start_execution))
        .route("/api/update", post(execution::update_execution))
        .route("/api/step", post(execution::update_step))
        .route("/api/executions", get(execution::list_executions))
        // Observation channel (monitor → observers)
        .route("/ws", get(observe::observe))
        // Add state and middleware
        .with_state(store)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
