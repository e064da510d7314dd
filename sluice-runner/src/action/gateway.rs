//! Action Gateway
//!
//! Single entry point for invoking an action by name. The gateway never
//! returns an error: unknown actions, schema violations, action failures and
//! panics all come back as `ActionResult { success: false, error }`.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ActionContext, ActionError, ActionRegistry, ActionResult};

#[derive(Clone)]
pub struct ActionGateway {
    registry: Arc<ActionRegistry>,
}

impl ActionGateway {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Validates `input`, runs the action and validates what it returns
    pub async fn execute(&self, name: &str, input: JsonValue, ctx: &ActionContext) -> ActionResult {
        match self.try_execute(name, input, ctx).await {
            Ok(output) => ActionResult::ok(output),
            Err(err) => {
                debug!("Action {} failed: {}", name, err);
                err.into()
            }
        }
    }

    async fn try_execute(
        &self,
        name: &str,
        input: JsonValue,
        ctx: &ActionContext,
    ) -> Result<JsonValue, ActionError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;

        let problems = entry.input_errors(&input);
        if !problems.is_empty() {
            return Err(ActionError::InvalidInput {
                action: name.to_string(),
                details: problems.join("; "),
            });
        }

        // Run on its own task so a panicking action surfaces as a JoinError
        let action = entry.action();
        let task_ctx = ctx.clone();
        let output = tokio::spawn(async move { action.execute(input, &task_ctx).await })
            .await
            .map_err(|e| {
                warn!("Action {} task failed: {}", name, e);
                ActionError::Panicked(name.to_string())
            })?
            .map_err(|e| ActionError::Failed(format!("{:#}", e)))?;

        let problems = entry.output_errors(&output);
        if !problems.is_empty() {
            return Err(ActionError::InvalidOutput {
                action: name.to_string(),
                details: problems.join("; "),
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Echo,
        Fail,
        Panic,
        WrongShape,
    }

    struct Probe {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Action for Probe {
        fn name(&self) -> &str {
            "test/probe"
        }

        fn input_schema(&self) -> JsonValue {
            json!({
                "type": "object",
                "properties": { "value": { "type": "number" } },
                "required": ["value"]
            })
        }

        fn output_schema(&self) -> JsonValue {
            json!({
                "type": "object",
                "properties": { "value": { "type": "number" } },
                "required": ["value"]
            })
        }

        async fn execute(
            &self,
            input: JsonValue,
            ctx: &ActionContext,
        ) -> anyhow::Result<JsonValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Echo => Ok(json!({ "value": input["value"], "agent": ctx.agent })),
                Behavior::Fail => anyhow::bail!("division error"),
                Behavior::Panic => panic!("probe exploded"),
                Behavior::WrongShape => Ok(json!({ "value": "six" })),
            }
        }
    }

    fn gateway(behavior: Behavior) -> (ActionGateway, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry
            .register(Probe {
                behavior,
                calls: Arc::clone(&calls),
            })
            .unwrap();
        (ActionGateway::new(registry), calls)
    }

    fn ctx() -> ActionContext {
        ActionContext::new("tester", "probe-pipeline")
    }

    #[tokio::test]
    async fn test_success_passes_output_and_context() {
        let (gateway, _) = gateway(Behavior::Echo);

        let result = gateway.execute("test/probe", json!({ "value": 3 }), &ctx()).await;

        assert!(result.success);
        assert_eq!(result.output, Some(json!({ "value": 3, "agent": "tester" })));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_action_names_the_action() {
        let (gateway, _) = gateway(Behavior::Echo);

        let result = gateway.execute("foo/bar", json!({}), &ctx()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("foo/bar"));
    }

    #[tokio::test]
    async fn test_invalid_input_skips_the_action_body() {
        let (gateway, calls) = gateway(Behavior::Echo);

        let result = gateway.execute("test/probe", json!({ "value": "3" }), &ctx()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid input for test/probe"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_action_error_message_is_preserved() {
        let (gateway, _) = gateway(Behavior::Fail);

        let result = gateway.execute("test/probe", json!({ "value": 3 }), &ctx()).await;

        assert_eq!(result, ActionResult::failure("division error"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (gateway, calls) = gateway(Behavior::Panic);

        let result = gateway.execute("test/probe", json!({ "value": 3 }), &ctx()).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Action test/probe panicked"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_output_fails_after_running() {
        let (gateway, calls) = gateway(Behavior::WrongShape);

        let result = gateway.execute("test/probe", json!({ "value": 3 }), &ctx()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid output from test/probe"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
