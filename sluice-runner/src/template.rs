//! Template resolution
//!
//! Step inputs are JSON values whose string leaves may contain `{{ path }}`
//! placeholders. Resolution walks the template and substitutes each
//! placeholder with the value found at `path` in the execution context.
//!
//! Two forms are recognized:
//! - a string that is only a placeholder (`"{{ steps.a.output }}"`) becomes the
//!   raw value at that path, whatever its type
//! - placeholders embedded in other text (`"total: {{ steps.a.output.value }}"`)
//!   are replaced by their textual form: strings as-is, anything else as JSON
//!
//! A path that does not resolve is "undefined": a lone placeholder becomes
//! `null` (or disappears if it is an object field), an embedded one becomes
//! the empty string. Resolution never fails.

use serde_json::{Map, Value as JsonValue};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Resolves every placeholder in `template` against `context`
pub fn resolve(template: &JsonValue, context: &JsonValue) -> JsonValue {
    resolve_value(template, context).unwrap_or(JsonValue::Null)
}

/// Looks up a dot-separated path such as `steps.fetch.output.url`
///
/// Numeric segments index into arrays. Returns `None` as soon as a segment
/// is missing or the current value cannot be descended into.
pub fn lookup<'a>(path: &str, context: &'a JsonValue) -> Option<&'a JsonValue> {
    path.split('.').try_fold(context, |current, segment| match current {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// `None` means the value is undefined
fn resolve_value(template: &JsonValue, context: &JsonValue) -> Option<JsonValue> {
    match template {
        JsonValue::String(text) => resolve_string(text, context),
        JsonValue::Array(items) => Some(JsonValue::Array(
            items
                .iter()
                .map(|item| resolve_value(item, context).unwrap_or(JsonValue::Null))
                .collect(),
        )),
        JsonValue::Object(fields) => {
            let mut resolved = Map::with_capacity(fields.len());
            for (key, value) in fields {
                if let Some(value) = resolve_value(value, context) {
                    resolved.insert(key.clone(), value);
                }
            }
            Some(JsonValue::Object(resolved))
        }
        other => Some(other.clone()),
    }
}

fn resolve_string(text: &str, context: &JsonValue) -> Option<JsonValue> {
    if let Some(path) = sole_placeholder(text) {
        return lookup(path, context).cloned();
    }

    if !text.contains(OPEN) {
        return Some(JsonValue::String(text.to_string()));
    }

    Some(JsonValue::String(interpolate(text, context)))
}

/// Returns the trimmed path if `text` consists of exactly one placeholder
fn sole_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    if inner.contains(OPEN) || inner.contains(CLOSE) {
        return None;
    }
    let path = inner.trim();
    (!path.is_empty()).then_some(path)
}

fn interpolate(text: &str, context: &JsonValue) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };

        let path = after_open[..end].trim();
        if path.is_empty() {
            // Not a placeholder; keep the braces verbatim
            out.push_str(&rest[..start + OPEN.len() + end + CLOSE.len()]);
        } else {
            out.push_str(&rest[..start]);
            if let Some(value) = lookup(path, context) {
                out.push_str(&render(value));
            }
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
