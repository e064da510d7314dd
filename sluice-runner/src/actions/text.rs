//! `text/*` actions

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use crate::action::{Action, ActionContext};

/// Counts whitespace-separated words in a string
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `{ text } -> { words, characters }`
pub struct WordCount;

#[async_trait]
impl Action for WordCount {
    fn name(&self) -> &str {
        "text/word-count"
    }

    fn description(&self) -> &str {
        "Count words and characters in a text"
    }

    fn input_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    fn output_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "words": { "type": "integer", "minimum": 0 },
                "characters": { "type": "integer", "minimum": 0 }
            },
            "required": ["words", "characters"]
        })
    }

    async fn execute(&self, input: JsonValue, _ctx: &ActionContext) -> anyhow::Result<JsonValue> {
        let text = input["text"].as_str().unwrap_or_default();
        Ok(json!({
            "words": count_words(text),
            "characters": text.chars().count(),
        }))
    }
}
