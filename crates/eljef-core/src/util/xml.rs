//! XML documents as configuration values.
//!
//! An element maps to `{name: content}`. Attributes become `@name` keys,
//! text alongside child elements or attributes becomes `#text`, repeated
//! children collapse into a sequence, a text-only element is a string and an
//! empty element is `null`.

use eljef_types::{EljefError, Format, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use super::data::{kind, DumpOptions};

const ATTR_PREFIX: char = '@';
const TEXT_KEY: &str = "#text";

#[derive(Default)]
struct Node {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut node = Node {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(|e| EljefError::parse(Format::Xml, e))?;
            let key = format!("{}{}", ATTR_PREFIX, String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .unescape_value()
                .map_err(|e| EljefError::parse(Format::Xml, e))?;
            node.attrs.insert(key, Value::String(value.into_owned()));
        }
        Ok(node)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        let value = if self.attrs.is_empty() && self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            let mut map = self.attrs;
            map.extend(self.children);
            if !text.is_empty() {
                map.insert(TEXT_KEY.to_string(), Value::String(text));
            }
            Value::Object(map)
        };
        (self.name, value)
    }
}

/// Parse an XML document into a single-rooted mapping.
pub fn loads(content: &str) -> Result<Value> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| EljefError::parse(Format::Xml, format!("at position {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Node::open(&start)?.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| EljefError::parse(Format::Xml, e))?;
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| EljefError::parse(Format::Xml, "unexpected closing tag"))?;
                let (name, value) = node.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(EljefError::parse(Format::Xml, format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| EljefError::parse(Format::Xml, "document has no root element"))?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(Value::Object(map))
}

fn attach(
    stack: &mut [Node],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None if root.is_none() => *root = Some((name, value)),
        None => {
            return Err(EljefError::parse(Format::Xml, format!("second root element <{}>", name)));
        }
    }
    Ok(())
}

/// Serialize a single-rooted mapping as an XML document.
pub fn dumps(value: &Value, options: &DumpOptions) -> Result<String> {
    let (name, content) = match value {
        Value::Object(map) if map.len() == 1 => map.iter().next().ok_or_else(|| {
            EljefError::Type("XML output needs exactly one root element".to_string())
        })?,
        other => {
            return Err(EljefError::Type(format!(
                "XML output needs a mapping with exactly one root key, got {}",
                kind(other)
            )));
        }
    };
    if content.is_array() {
        return Err(EljefError::Type(format!(
            "XML root element <{}> cannot be a sequence",
            name
        )));
    }

    let mut writer = if options.pretty && options.indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };

    if options.full_document {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_err)?;
    }
    write_element(&mut writer, name, content)?;

    String::from_utf8(writer.into_inner()).map_err(|e| EljefError::Other(e.to_string()))
}

fn write_err(e: impl std::fmt::Display) -> EljefError {
    EljefError::Other(format!("failed to write XML: {}", e))
}

/// XML `Name` production, restricted to what a mapping key can spell.
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EljefError::Type(format!("'{}' is not a valid XML name", name)))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    check_name(name)?;
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            let mut text = None;
            let mut children = Vec::new();
            for (key, val) in map {
                if let Some(attr) = key.strip_prefix(ATTR_PREFIX) {
                    check_name(attr)?;
                    let attr_value = scalar_text(val).unwrap_or_default();
                    start.push_attribute((attr, attr_value.as_str()));
                } else if key == TEXT_KEY {
                    text = scalar_text(val);
                } else {
                    children.push((key, val));
                }
            }

            if text.is_none() && children.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(write_err)?;
                return Ok(());
            }

            writer.write_event(Event::Start(start)).map_err(write_err)?;
            if let Some(text) = text {
                writer.write_event(Event::Text(BytesText::new(&text))).map_err(write_err)?;
            }
            for (key, val) in children {
                write_element(writer, key, val)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name))).map_err(write_err)?;
        }
        scalar => match scalar_text(scalar) {
            Some(text) => {
                writer.write_event(Event::Start(BytesStart::new(name))).map_err(write_err)?;
                writer.write_event(Event::Text(BytesText::new(&text))).map_err(write_err)?;
                writer.write_event(Event::End(BytesEnd::new(name))).map_err(write_err)?;
            }
            None => {
                writer.write_event(Event::Empty(BytesStart::new(name))).map_err(write_err)?;
            }
        },
    }
    Ok(())
}
