//! `math/*` actions

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use crate::action::{Action, ActionContext};

fn value_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": { "value": { "type": "number" } },
        "required": ["value"]
    })
}

/// Applies `int` when the operand is an integer that does not overflow,
/// `float` otherwise, so integral inputs stay integral
fn apply(
    input: &JsonValue,
    int: impl Fn(i64) -> Option<i64>,
    float: impl Fn(f64) -> f64,
) -> anyhow::Result<JsonValue> {
    let value = &input["value"];

    if let Some(result) = value.as_i64().and_then(int) {
        return Ok(json!({ "value": result }));
    }

    let operand = value
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("value must be a number"))?;
    let result = float(operand);
    if !result.is_finite() {
        anyhow::bail!("result of {} is not a finite number", operand);
    }
    Ok(json!({ "value": result }))
}

/// `{ value } -> { value: value * 2 }`
pub struct Double;

#[async_trait]
impl Action for Double {
    fn name(&self) -> &str {
        "math/double"
    }

    fn description(&self) -> &str {
        "Multiply a number by two"
    }

    fn input_schema(&self) -> JsonValue {
        value_schema()
    }

    fn output_schema(&self) -> JsonValue {
        value_schema()
    }

    async fn execute(&self, input: JsonValue, _ctx: &ActionContext) -> anyhow::Result<JsonValue> {
        apply(&input, |v| v.checked_mul(2), |v| v * 2.0)
    }
}

/// `{ value } -> { value: value ** 2 }`
pub struct Square;

#[async_trait]
impl Action for Square {
    fn name(&self) -> &str {
        "math/square"
    }

    fn description(&self) -> &str {
        "Raise a number to the second power"
    }

    fn input_schema(&self) -> JsonValue {
        value_schema()
    }

    fn output_schema(&self) -> JsonValue {
        value_schema()
    }

    async fn execute(&self, input: JsonValue, _ctx: &ActionContext) -> anyhow::Result<JsonValue> {
        apply(&input, |v| v.checked_mul(v), |v| v * v)
    }
}
