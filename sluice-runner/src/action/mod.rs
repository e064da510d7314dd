//! Actions
//!
//! An action is a named unit of work with a JSON Schema for its input and its
//! output. Actions are registered once in an [`ActionRegistry`] at process
//! start and invoked by name through the [`ActionGateway`], which validates
//! both sides of the call and folds every failure into an [`ActionResult`].

mod gateway;
mod registry;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use gateway::ActionGateway;
pub use registry::{ActionRegistry, RegisteredAction, RegistryError, is_namespaced};

/// A schema-validated unit of executable behavior
///
/// `name` must have the `category/name` shape. `execute` only ever sees input
/// that already passed `input_schema`, and its return value is checked against
/// `output_schema` before anyone else sees it.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn input_schema(&self) -> JsonValue;

    fn output_schema(&self) -> JsonValue;

    async fn execute(&self, input: JsonValue, ctx: &ActionContext) -> anyhow::Result<JsonValue>;
}

/// Who is invoking an action and as part of which pipeline
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    pub agent: String,
    pub pipeline: String,
}

impl ActionContext {
    pub fn new(agent: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            pipeline: pipeline.into(),
        }
    }
}

/// Uniform outcome of an action invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(output: JsonValue) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

impl From<ActionError> for ActionResult {
    fn from(err: ActionError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Reasons an invocation did not produce a valid output
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action not found: {0}")]
    UnknownAction(String),

    #[error("Invalid input for {action}: {details}")]
    InvalidInput { action: String, details: String },

    #[error("Invalid output from {action}: {details}")]
    InvalidOutput { action: String, details: String },

    /// The action body returned an error; the message is passed through as-is
    #[error("{0}")]
    Failed(String),

    #[error("Action {0} panicked")]
    Panicked(String),
}
