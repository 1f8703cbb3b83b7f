//! Mapping wrapper with checked accessors.
//!
//! [`DictObj`] owns a mapping and exposes explicit lookups with defaults
//! instead of dynamic field access. Mutations write straight into the owned
//! mapping.

use eljef_types::{EljefError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

use crate::util::data;

/// A configuration mapping with key accessors.
///
/// # Example
///
/// ```
/// use eljef_core::DictObj;
/// use serde_json::json;
///
/// let obj = DictObj::new(json!({"key": "value", "nested": {"port": 80}})).unwrap();
/// assert_eq!(obj.get("key").unwrap(), "value");
/// assert_eq!(obj.get_or("missing", &json!(0)), &json!(0));
/// assert_eq!(obj.section("nested").unwrap().get_as::<u16>("port").unwrap(), 80);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictObj {
    map: Map<String, Value>,
}

impl DictObj {
    /// Wrap a mapping value.
    ///
    /// # Errors
    ///
    /// A `Type` error when `value` is not a mapping.
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(EljefError::Type(format!(
                "supplied value is a {}, not a mapping",
                data::kind(&other)
            ))),
        }
    }

    /// Wrap an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is missing.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.map.get(key).ok_or_else(|| missing(key))
    }

    /// Value stored under `key`, or `default` when it is missing.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.map.get(key).unwrap_or(default)
    }

    /// Value stored under `key`, decoded into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get(key)?.clone())?)
    }

    /// Value at a dotted path such as `server.tls.port`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.map.get(head)?;
        match rest {
            Some(rest) => data::get_path(value, rest),
            None => Some(value),
        }
    }

    /// Nested mapping under `key` as its own wrapper.
    ///
    /// The section is a copy; changes to it do not affect `self`.
    pub fn section(&self, key: &str) -> Result<DictObj> {
        DictObj::new(self.get(key)?.clone())
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.map.iter()
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.map.insert(key.into(), value.into())
    }

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key is missing.
    pub fn remove(&mut self, key: &str) -> Result<Value> {
        self.map.remove(key).ok_or_else(|| missing(key))
    }

    /// Remove `key` and return its value, or `default` when it is missing.
    pub fn pop_or(&mut self, key: &str, default: Value) -> Value {
        self.map.remove(key).unwrap_or(default)
    }

    /// Insert every entry of `other`, replacing existing keys.
    pub fn update(&mut self, other: Map<String, Value>) {
        self.map.extend(other);
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Copy out as a plain mapping value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.map.clone())
    }

    /// Unwrap into a plain mapping value.
    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}

fn missing(key: &str) -> EljefError {
    EljefError::NotFound(format!("key '{}'", key))
}

impl TryFrom<Value> for DictObj {
    type Error = EljefError;

    fn try_from(value: Value) -> Result<Self> {
        DictObj::new(value)
    }
}

impl From<DictObj> for Value {
    fn from(obj: DictObj) -> Self {
        obj.into_value()
    }
}

impl<'a> IntoIterator for &'a DictObj {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl fmt::Display for DictObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} : {}", key, value)?;
        }
        write!(f, "}}")
    }
}
