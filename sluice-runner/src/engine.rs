//! Execution Engine
//!
//! Runs one pipeline invocation from start to finish:
//! 1. load the definition (a failure here ends the run before anything is reported)
//! 2. announce the run and mark it running
//! 3. for each step in declaration order: mark it running, resolve its input
//!    against the context, invoke the action, record the output or stop at
//!    the first failure
//! 4. announce the terminal pipeline status
//!
//! The context is `{ input, steps: { <id>: { output } } }` and only ever gains
//! entries for completed steps, so a step can see outputs of earlier steps
//! only. Every announcement goes through the [`Reporter`], which cannot fail;
//! the returned [`RunOutcome`] is the same whether or not anyone listens.

use anyhow::Context as _;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use sluice_client::{DisabledReporter, HttpReporter, Reporter};
use sluice_core::domain::definition::Step;
use sluice_core::domain::execution::ExecutionStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::action::{ActionContext, ActionGateway};
use crate::actions::builtin_registry;
use crate::config::Config;
use crate::definition::{DefinitionSource, DirectorySource};
use crate::template;

/// Result of one run as seen by the direct caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    fn completed(result: JsonValue) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

pub struct Engine {
    definitions: Arc<dyn DefinitionSource>,
    gateway: ActionGateway,
    reporter: Arc<dyn Reporter>,
    step_delay: Duration,
}

impl Engine {
    pub fn new(
        definitions: Arc<dyn DefinitionSource>,
        gateway: ActionGateway,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            definitions,
            gateway,
            reporter,
            step_delay: Duration::ZERO,
        }
    }

    /// Builds an engine with the built-in actions, pipelines from
    /// `config.pipelines_dir` and reporting to `config.monitor_url`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = builtin_registry().context("Failed to register built-in actions")?;

        let reporter: Arc<dyn Reporter> = match &config.monitor_url {
            Some(url) => Arc::new(
                HttpReporter::new(url.clone(), config.report_timeout)
                    .context("Failed to create monitor reporter")?,
            ),
            None => Arc::new(DisabledReporter),
        };

        Ok(Self::new(
            Arc::new(DirectorySource::new(config.pipelines_dir.clone())),
            ActionGateway::new(registry),
            reporter,
        )
        .with_step_delay(config.step_delay))
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Runs `pipeline` with `input` on behalf of `agent`
    pub async fn run(&self, pipeline: &str, input: JsonValue, agent: &str) -> RunOutcome {
        let definition = match self.definitions.load(pipeline).await {
            Ok(definition) => definition,
            Err(e) => {
                warn!("[{}] Cannot start {}: {}", agent, pipeline, e);
                return RunOutcome::failed(e.to_string());
            }
        };

        info!(
            "[{}] Starting pipeline {} ({} steps)",
            agent,
            pipeline,
            definition.steps.len()
        );

        // Runs are reported under the requested name, not the definition's `name:`
        let execution_id = self
            .reporter
            .start(agent, pipeline, &definition.step_summaries())
            .await;
        let progress = Progress {
            reporter: self.reporter.as_ref(),
            execution_id,
        };
        progress
            .pipeline(ExecutionStatus::Running, None, None)
            .await;

        let ctx = ActionContext::new(agent, pipeline);
        let mut context = ExecutionContext::new(input);

        for step in &definition.steps {
            progress
                .step(&step.id, ExecutionStatus::Running, None, None)
                .await;

            match self.run_step(step, &context, &ctx).await {
                Ok(output) => {
                    debug!("[{}] Step {} completed", agent, step.id);
                    context.record(&step.id, output.clone());
                    progress
                        .step(&step.id, ExecutionStatus::Completed, Some(output), None)
                        .await;
                }
                Err(error) => {
                    warn!("[{}] Step {} failed: {}", agent, step.id, error);
                    progress
                        .step(&step.id, ExecutionStatus::Failed, None, Some(error.clone()))
                        .await;
                    progress
                        .pipeline(ExecutionStatus::Failed, None, Some(error.clone()))
                        .await;
                    return RunOutcome::failed(error);
                }
            }

            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
        }

        let result = context.into_result();
        progress
            .pipeline(ExecutionStatus::Completed, Some(result.clone()), None)
            .await;
        info!("[{}] Pipeline {} completed", agent, pipeline);

        RunOutcome::completed(result)
    }

    async fn run_step(
        &self,
        step: &Step,
        context: &ExecutionContext,
        ctx: &ActionContext,
    ) -> Result<JsonValue, String> {
        let input = template::resolve(&step.input, &context.value);
        debug!("Step {} resolved input: {}", step.id, input);

        let result = self.gateway.execute(&step.action, input, ctx).await;
        match (result.success, result.output) {
            (true, output) => Ok(output.unwrap_or(JsonValue::Null)),
            (false, _) => Err(result
                .error
                .unwrap_or_else(|| format!("Action {} failed", step.action))),
        }
    }
}

/// Accumulated `{ input, steps }` of a single run
struct ExecutionContext {
    value: JsonValue,
}

impl ExecutionContext {
    fn new(input: JsonValue) -> Self {
        Self {
            value: json!({ "input": input, "steps": {} }),
        }
    }

    fn record(&mut self, step_id: &str, output: JsonValue) {
        if let Some(steps) = self.value.get_mut("steps").and_then(JsonValue::as_object_mut) {
            steps.insert(step_id.to_string(), json!({ "output": output }));
        }
    }

    fn into_result(mut self) -> JsonValue {
        let steps = self
            .value
            .get_mut("steps")
            .map(JsonValue::take)
            .unwrap_or_else(|| JsonValue::Object(Map::new()));
        json!({ "steps": steps })
    }
}

/// Reporter calls for one run; silent when the monitor gave no id
struct Progress<'a> {
    reporter: &'a dyn Reporter,
    execution_id: Option<Uuid>,
}

impl Progress<'_> {
    async fn pipeline(
        &self,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) {
        if let Some(id) = self.execution_id {
            self.reporter.pipeline(id, status, result, error).await;
        }
    }

    async fn step(
        &self,
        step_id: &str,
        status: ExecutionStatus,
        output: Option<JsonValue>,
        error: Option<String>,
    ) {
        if let Some(id) = self.execution_id {
            self.reporter.step(id, step_id, status, output, error).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionRegistry};
    use crate::actions::{Double, Square};
    use crate::definition::{DefinitionError, StaticSource};
    use async_trait::async_trait;
    use sluice_core::domain::definition::{PipelineDefinition, StepSummary};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every notification as a short line
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Reporter for Recorder {
        async fn start(&self, _agent: &str, pipeline: &str, steps: &[StepSummary]) -> Option<Uuid> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("start {} {}", pipeline, steps.len()));
            Some(Uuid::new_v4())
        }

        async fn pipeline(
            &self,
            _execution_id: Uuid,
            status: ExecutionStatus,
            _result: Option<JsonValue>,
            error: Option<String>,
        ) {
            let mut line = format!("pipeline {}", status);
            if let Some(error) = error {
                line.push_str(&format!(" ({})", error));
            }
            self.calls.lock().unwrap().push(line);
        }

        async fn step(
            &self,
            _execution_id: Uuid,
            step_id: &str,
            status: ExecutionStatus,
            _output: Option<JsonValue>,
            _error: Option<String>,
        ) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("step {} {}", step_id, status));
        }
    }

    struct Broken;

    #[async_trait]
    impl Action for Broken {
        fn name(&self) -> &str {
            "math/double"
        }

        fn input_schema(&self) -> JsonValue {
            json!({ "type": "object" })
        }

        fn output_schema(&self) -> JsonValue {
            json!({ "type": "object" })
        }

        async fn execute(
            &self,
            _input: JsonValue,
            _ctx: &ActionContext,
        ) -> anyhow::Result<JsonValue> {
            anyhow::bail!("division error")
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Action for Counting {
        fn name(&self) -> &str {
            "math/square"
        }

        fn input_schema(&self) -> JsonValue {
            json!({ "type": "object" })
        }

        fn output_schema(&self) -> JsonValue {
            json!({ "type": "object" })
        }

        async fn execute(
            &self,
            input: JsonValue,
            _ctx: &ActionContext,
        ) -> anyhow::Result<JsonValue> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(input)
        }
    }

    fn step(id: &str, action: &str, input: JsonValue) -> Step {
        Step {
            id: id.to_string(),
            action: action.to_string(),
            input,
        }
    }

    fn chain() -> PipelineDefinition {
        PipelineDefinition {
            name: "chain".to_string(),
            version: "1".to_string(),
            description: String::new(),
            steps: vec![
                step("a", "math/double", json!({ "value": "{{ input.value }}" })),
                step("b", "math/square", json!({ "value": "{{steps.a.output.value}}" })),
            ],
        }
    }

    fn engine(registry: ActionRegistry, definition: PipelineDefinition) -> (Engine, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let engine = Engine::new(
            Arc::new(StaticSource::new().with(definition)),
            ActionGateway::new(registry),
            recorder.clone(),
        );
        (engine, recorder)
    }

    fn math_registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register(Double).unwrap();
        registry.register(Square).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_two_step_chain_completes() {
        let (engine, recorder) = engine(math_registry(), chain());

        let outcome = engine.run("chain", json!({ "value": 3 }), "agent-1").await;

        assert_eq!(
            outcome,
            RunOutcome::completed(json!({
                "steps": {
                    "a": { "output": { "value": 6 } },
                    "b": { "output": { "value": 36 } }
                }
            }))
        );
        assert_eq!(
            recorder.calls(),
            vec![
                "start chain 2",
                "pipeline running",
                "step a running",
                "step a completed",
                "step b running",
                "step b completed",
                "pipeline completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry.register(Broken).unwrap();
        registry.register(Counting(invoked.clone())).unwrap();
        let (engine, recorder) = engine(registry, chain());

        let outcome = engine.run("chain", json!({ "value": 3 }), "agent-1").await;

        assert_eq!(outcome, RunOutcome::failed("division error"));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(
            recorder.calls(),
            vec![
                "start chain 2",
                "pipeline running",
                "step a running",
                "step a failed",
                "pipeline failed (division error)",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_action_fails_the_run() {
        let definition = PipelineDefinition {
            name: "lost".to_string(),
            version: String::new(),
            description: String::new(),
            steps: vec![step("only", "foo/bar", json!({}))],
        };
        let (engine, recorder) = engine(math_registry(), definition);

        let outcome = engine.run("lost", json!({}), "agent-1").await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("foo/bar"));
        assert_eq!(recorder.calls().last().unwrap(), "pipeline failed (Action not found: foo/bar)");
    }

    #[tokio::test]
    async fn test_missing_definition_reports_nothing() {
        let (engine, recorder) = engine(math_registry(), chain());

        let outcome = engine.run("nope", json!({}), "agent-1").await;

        assert_eq!(outcome, RunOutcome::failed("Pipeline not found: nope"));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_later_steps_are_not_visible() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry.register(Counting(invoked.clone())).unwrap();
        let definition = PipelineDefinition {
            name: "peek".to_string(),
            version: String::new(),
            description: String::new(),
            steps: vec![
                step(
                    "first",
                    "math/square",
                    json!({ "ahead": "{{ steps.second.output }}", "v": 1 }),
                ),
                step("second", "math/square", json!({ "behind": "{{ steps.first.output.v }}" })),
            ],
        };
        let (engine, _) = engine(registry, definition);

        let outcome = engine.run("peek", json!({}), "agent-1").await;

        assert_eq!(invoked.load(Ordering::SeqCst), 2);
        assert_eq!(
            outcome.result.unwrap()["steps"],
            json!({
                "first": { "output": { "v": 1 } },
                "second": { "output": { "behind": 1 } }
            })
        );
    }

    /// Serves the same definition under any name
    struct Aliased(PipelineDefinition);

    #[async_trait]
    impl DefinitionSource for Aliased {
        async fn load(&self, _name: &str) -> Result<PipelineDefinition, DefinitionError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_run_is_reported_under_requested_name() {
        let recorder = Arc::new(Recorder::default());
        let engine = Engine::new(
            Arc::new(Aliased(chain())),
            ActionGateway::new(math_registry()),
            recorder.clone(),
        );

        let outcome = engine.run("math-chain", json!({ "value": 1 }), "agent-1").await;

        assert!(outcome.success);
        assert_eq!(recorder.calls()[0], "start math-chain 2");
    }

    #[tokio::test]
    async fn test_outcome_is_the_same_without_reporting() {
        let (reported, _) = engine(math_registry(), chain());
        let silent = Engine::new(
            Arc::new(StaticSource::new().with(chain())),
            ActionGateway::new(math_registry()),
            Arc::new(DisabledReporter),
        );

        let a = reported.run("chain", json!({ "value": 5 }), "x").await;
        let b = silent.run("chain", json!({ "value": 5 }), "x").await;

        assert_eq!(a, b);
        assert_eq!(b.result.unwrap()["steps"]["b"]["output"]["value"], 100);
    }
}
