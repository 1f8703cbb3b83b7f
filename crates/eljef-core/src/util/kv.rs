//! `key=value` text, one pair per line.

use eljef_types::{EljefError, Result};
use serde_json::{Map, Value};

use super::data::kind;

/// Leading characters that mark a whole line as a comment.
const COMMENT_CHECKS: [char; 3] = [';', '#', '/'];

/// Parse key/value lines into a mapping of strings.
///
/// Blank lines, comment lines and lines without `=` are skipped. Keys and
/// values are trimmed and the value is everything after the first `=`. When
/// `inline_comment` is given, anything after that marker is dropped first.
pub fn loads(data: &str, inline_comment: Option<&str>) -> Map<String, Value> {
    let mut ret = Map::new();

    for line in data.replace("\r\n", "\n").split('\n') {
        let mut line = line.trim();
        if line.is_empty() || line.starts_with(&COMMENT_CHECKS[..]) {
            continue;
        }
        if let Some(marker) = inline_comment.filter(|m| !m.is_empty()) {
            if let Some(pos) = line.find(marker) {
                line = line[..pos].trim_end();
            }
        }
        if let Some((key, value)) = line.split_once('=') {
            ret.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
        }
    }

    ret
}

/// Render a flat mapping as key/value lines joined by `\n`.
///
/// # Errors
///
/// Returns a `Type` error when a value is a mapping or a sequence.
pub fn dumps(data: &Map<String, Value>, spaced: bool) -> Result<String> {
    let equals = if spaced { " = " } else { "=" };
    let mut lines = Vec::with_capacity(data.len());

    for (key, value) in data {
        let value = match value {
            Value::Object(_) | Value::Array(_) => {
                return Err(EljefError::Type(format!(
                    "value for key '{}' is a {}",
                    key,
                    kind(value)
                )));
            }
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        lines.push(format!("{}{}{}", key, equals, value));
    }

    Ok(lines.join("\n"))
}
