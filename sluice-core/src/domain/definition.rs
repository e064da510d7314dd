//! Pipeline definition types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Pipeline definition
///
/// Loaded by name from a definition source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

/// One step of a pipeline
///
/// `input` is a template: string leaves may contain `{{ path }}` placeholders
/// resolved against the execution context right before the step runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub action: String,
    #[serde(default = "empty_input")]
    pub input: JsonValue,
}

fn empty_input() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

/// Identity of a step as announced to the monitor when a run starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub id: String,
    pub action: String,
}

impl From<&Step> for StepSummary {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.clone(),
            action: step.action.clone(),
        }
    }
}

impl PipelineDefinition {
    /// Summaries of all steps in declaration order
    pub fn step_summaries(&self) -> Vec<StepSummary> {
        self.steps.iter().map(StepSummary::from).collect()
    }
}
