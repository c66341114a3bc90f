//! Property values and the per-element property bag

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Property keys are plain strings
pub type PropertyKey = String;

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Bool(_) => "Bool",
            PropertyValue::Int(_) => "Int",
            PropertyValue::Float(_) => "Float",
            PropertyValue::String(_) => "String",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Map(_) => "Map",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, map[key])?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Int(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

impl From<HashMap<String, PropertyValue>> for PropertyValue {
    fn from(map: HashMap<String, PropertyValue>) -> Self {
        PropertyValue::Map(map)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

/// Typed extraction from a stored value.
///
/// Returns `None` when the stored variant does not hold a `Self`; a type
/// mismatch is never an error.
pub trait FromProperty: Sized {
    fn from_property(value: &PropertyValue) -> Option<Self>;
}

impl FromProperty for PropertyValue {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromProperty for String {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromProperty for i64 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromProperty for i32 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_int().and_then(|i| i32::try_from(i).ok())
    }
}

impl FromProperty for u64 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_int().and_then(|i| u64::try_from(i).ok())
    }
}

impl FromProperty for f64 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromProperty for bool {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromProperty for Vec<PropertyValue> {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_array().map(<[PropertyValue]>::to_vec)
    }
}

impl FromProperty for HashMap<String, PropertyValue> {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        value.as_map().cloned()
    }
}

/// Names of the keys that hold an element's identity inside its bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedKeys {
    pub id: PropertyKey,
    pub revision: PropertyKey,
    pub label: PropertyKey,
}

impl ReservedKeys {
    pub fn new(
        id: impl Into<PropertyKey>,
        revision: impl Into<PropertyKey>,
        label: impl Into<PropertyKey>,
    ) -> Self {
        Self {
            id: id.into(),
            revision: revision.into(),
            label: label.into(),
        }
    }

    /// True if `key` names part of the element identity.
    ///
    /// The label key is reserved alongside id and revision.
    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.id || key == self.revision || key == self.label
    }
}

impl Default for ReservedKeys {
    fn default() -> Self {
        Self::new("Id", "RevId", "Label")
    }
}

/// Key/value storage owned by a single element.
///
/// The bag itself performs no checks; the owning element guards reserved
/// keys and runs the vote protocol before touching it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: HashMap<PropertyKey, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: PropertyKey, value: PropertyValue) -> Option<PropertyValue> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PropertyKey, PropertyValue)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (PropertyKey, PropertyValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
