//! `format/markdown`
//!
//! Renders a string or a structured object as markdown. Strings are passed
//! through (with an optional title); objects are laid out by template:
//! - `report` (or `article`): one `## Heading` per key, arrays as bullets,
//!   objects as fenced JSON
//! - `list`: one `- **key:** value` line per key
//! - `raw` (default): pretty-printed JSON

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};

use super::text::count_words;
use crate::action::{Action, ActionContext};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Template {
    #[serde(alias = "article")]
    Report,
    List,
    #[default]
    Raw,
}

#[derive(Debug, Deserialize)]
struct Input {
    content: JsonValue,
    #[serde(default)]
    template: Template,
    title: Option<String>,
}

pub struct Markdown;

#[async_trait]
impl Action for Markdown {
    fn name(&self) -> &str {
        "format/markdown"
    }

    fn description(&self) -> &str {
        "Format content as clean markdown"
    }

    fn input_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": ["string", "object"] },
                "template": { "enum": ["report", "article", "list", "raw"] },
                "title": { "type": "string" }
            },
            "required": ["content"]
        })
    }

    fn output_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "markdown": { "type": "string" },
                "wordCount": { "type": "integer", "minimum": 0 }
            },
            "required": ["markdown", "wordCount"]
        })
    }

    async fn execute(&self, input: JsonValue, _ctx: &ActionContext) -> anyhow::Result<JsonValue> {
        let input: Input = serde_json::from_value(input)?;
        let title = input.title.as_deref();

        let markdown = match &input.content {
            JsonValue::String(text) => with_title(title, text.clone()),
            JsonValue::Object(fields) => match input.template {
                Template::Report => report(fields, title),
                Template::List => list(fields, title),
                Template::Raw => with_title(title, serde_json::to_string_pretty(&input.content)?),
            },
            other => anyhow::bail!("content must be a string or an object, got {}", other),
        };

        Ok(json!({
            "wordCount": count_words(&markdown),
            "markdown": markdown,
        }))
    }
}

fn with_title(title: Option<&str>, body: String) -> String {
    match title {
        Some(title) => format!("# {}\n\n{}", title, body),
        None => body,
    }
}

fn report(fields: &Map<String, JsonValue>, title: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(title) = title {
        lines.push(format!("# {}", title));
        lines.push(String::new());
    }

    for (key, value) in fields {
        lines.push(format!("## {}", heading(key)));
        lines.push(String::new());

        match value {
            JsonValue::Array(items) => {
                lines.extend(items.iter().map(|item| format!("- {}", inline(item))));
            }
            JsonValue::Object(_) => {
                lines.push("```json".to_string());
                lines.push(serde_json::to_string_pretty(value).unwrap_or_default());
                lines.push("```".to_string());
            }
            other => lines.push(inline(other)),
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn list(fields: &Map<String, JsonValue>, title: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(title) = title {
        lines.push(format!("# {}", title));
        lines.push(String::new());
    }

    for (key, value) in fields {
        match value {
            JsonValue::Array(items) => {
                lines.push(format!("**{}:**", key));
                lines.extend(items.iter().map(|item| format!("  - {}", inline(item))));
            }
            other => lines.push(format!("- **{}:** {}", key, inline(other))),
        }
    }

    lines.join("\n")
}

/// `key_name` -> `Key name`
fn heading(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn inline(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
