//! Attribute dictionaries carried by element nodes.
//!
//! Attributes are stored sparsely: a node only records values that were
//! explicitly set or parsed. Reads go through [`crate::Schema::attr`], which
//! falls back to the declared default, so lookups are total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single attribute value. Markup attributes are strings; a few
/// (heading level, image width, cell spans) are numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Str(String),
}

impl AttrValue {
    pub fn str(value: impl Into<String>) -> Self {
        AttrValue::Str(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            AttrValue::Str(_) => None,
        }
    }

    /// True for the values that mean "not set": the empty string and zero.
    pub fn is_unset(&self) -> bool {
        match self {
            AttrValue::Str(s) => s.is_empty(),
            AttrValue::Int(n) => *n == 0,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

/// An ordered attribute map. `BTreeMap` keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Attrs::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_int)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }
}

impl FromIterator<(String, AttrValue)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        Attrs(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_detection() {
        assert!(AttrValue::str("").is_unset());
        assert!(AttrValue::Int(0).is_unset());
        assert!(!AttrValue::str("left").is_unset());
        assert!(!AttrValue::Int(3).is_unset());
    }

    #[test]
    fn attrs_round_trip_deterministic_order() {
        let attrs = Attrs::new()
            .with("style", "color: red")
            .with("class", "note");
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"class":"note","style":"color: red"}"#);
    }
}
