//! Configuration value handling: parsing, serializing and deep merging.
//!
//! Every format is read into a `serde_json::Value` tree so layers coming
//! from YAML, XML, JSON or key/value files can be merged with each other.

use eljef_types::{EljefError, Format, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{kv, xml};

/// Serializer options used when writing a value out in a given format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    /// Indent width for JSON and pretty XML output; zero means compact
    pub indent: usize,
    /// Put spaces around `=` in key/value output
    pub spaced: bool,
    /// Indent nested XML elements
    pub pretty: bool,
    /// Emit the `<?xml ...?>` declaration
    pub full_document: bool,
}

impl DumpOptions {
    /// Default options for `format`.
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::Json => Self { indent: 4, spaced: false, pretty: true, full_document: false },
            Format::Kv => Self { indent: 0, spaced: false, pretty: false, full_document: false },
            Format::Xml => Self { indent: 4, spaced: false, pretty: true, full_document: true },
            Format::Yaml => Self { indent: 2, spaced: false, pretty: true, full_document: false },
        }
    }
}

/// Load YAML from string.
///
/// Merge keys (`<<: *anchor`) are resolved before conversion. Scalar mapping
/// keys such as `80:` or `true:` become their string form.
pub fn load_yaml(content: &str) -> Result<Value> {
    let mut doc: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| EljefError::parse(Format::Yaml, e))?;
    doc.apply_merge().map_err(|e| EljefError::parse(Format::Yaml, e))?;
    yaml_to_value(doc)
}

fn yaml_to_value(yaml: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_value).collect::<Result<_>>()?),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_value(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_value(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => {
            Err(EljefError::parse(Format::Yaml, "mapping keys must be scalars"))
        }
    }
}

/// Load JSON from string.
pub fn load_json(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| EljefError::parse(Format::Json, e))
}

/// Parse `content` as `format`.
pub fn loads(content: &str, format: Format) -> Result<Value> {
    match format {
        Format::Yaml => load_yaml(content),
        Format::Json => load_json(content),
        Format::Xml => xml::loads(content),
        Format::Kv => Ok(Value::Object(kv::loads(content, None))),
    }
}

/// Serialize `value` as `format`.
pub fn dumps(value: &Value, format: Format, options: &DumpOptions) -> Result<String> {
    match format {
        Format::Yaml => Ok(serde_yaml::to_string(value)?),
        Format::Json => dump_json(value, options.indent),
        Format::Xml => xml::dumps(value, options),
        Format::Kv => match value {
            Value::Object(map) => kv::dumps(map, options.spaced),
            other => Err(EljefError::Type(format!(
                "key/value output needs a mapping, got {}",
                kind(other)
            ))),
        },
    }
}

fn dump_json(value: &Value, indent: usize) -> Result<String> {
    if indent == 0 {
        return Ok(serde_json::to_string(value)?);
    }

    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    String::from_utf8(buf).map_err(|e| EljefError::Other(e.to_string()))
}

/// Short name of a value's shape, used in error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Deep merge two values; `overlay` has precedence.
///
/// Mappings are merged key by key, recursively. Sequences from the overlay
/// replace the base sequence wholesale. For every other pairing, including a
/// shape mismatch such as a mapping over a scalar, the overlay wins.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,
        (_, overlay) => overlay,
    }
}

/// Merge with absent values. An absent overlay keeps the base.
pub fn merge(base: Option<Value>, overlay: Option<Value>) -> Option<Value> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => Some(deep_merge(base, overlay)),
        (base, None) => base,
        (None, overlay) => overlay,
    }
}

/// Merge layers in order; the first is the base, the last has highest
/// precedence. Returns `None` for no layers.
pub fn merge_layers<I>(layers: I) -> Option<Value>
where
    I: IntoIterator<Item = Value>,
{
    layers.into_iter().fold(None, |acc, layer| merge(acc, Some(layer)))
}

/// An empty mapping value.
pub fn empty_mapping() -> Value {
    Value::Object(Map::new())
}

/// Flatten a nested value into dotted paths.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    fn flatten_recursive(value: &Value, prefix: String, result: &mut Vec<(String, Value)>) {
        let join = |key: &str| {
            if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", prefix, key)
            }
        };
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, val) in map {
                    flatten_recursive(val, join(key), result);
                }
            }
            Value::Array(arr) if !arr.is_empty() => {
                for (index, val) in arr.iter().enumerate() {
                    flatten_recursive(val, join(&index.to_string()), result);
                }
            }
            _ => {
                result.push((prefix, value.clone()));
            }
        }
    }

    let mut result = Vec::new();
    flatten_recursive(value, String::new(), &mut result);
    result
}

/// Get value at a path in dotted notation. Sequence elements are addressed
/// by index.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
