//! Vendor-specific extra values attached to a message.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Heterogeneous value stored in [`Extras`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ExtraValue {
    /// String view; only `Str` values qualify.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; numeric strings are parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view; `"true"`/`"false"` strings are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float view; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for ExtraValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ExtraValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ExtraValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Open mapping of vendor-specific keys to typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extras(BTreeMap<String, ExtraValue>);

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExtraValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.get(key)
    }

    /// Non-empty string value for `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(ExtraValue::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ExtraValue::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ExtraValue::as_bool)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ExtraValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtraValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let mut extras = Extras::new();
        extras.insert("sign_type", "sha1");
        extras.insert("playtimes", 3);
        extras.insert("report", true);
        extras.insert("ratio", 0.5);
        extras.insert("numeric", "42");

        assert_eq!(extras.get_str("sign_type"), Some("sha1"));
        assert_eq!(extras.get_i64("playtimes"), Some(3));
        assert_eq!(extras.get_i64("numeric"), Some(42));
        assert_eq!(extras.get_bool("report"), Some(true));
        assert_eq!(extras.get_f64("ratio"), Some(0.5));
        assert_eq!(extras.get_str("playtimes"), None);
        assert_eq!(extras.get_str("missing"), None);
    }

    #[test]
    fn deserializes_mixed_json() {
        let extras: Extras =
            serde_json::from_value(serde_json::json!({"a": "x", "b": 2, "c": false, "d": 1.5}))
                .unwrap();
        assert_eq!(extras.get("a"), Some(&ExtraValue::Str("x".into())));
        assert_eq!(extras.get("b"), Some(&ExtraValue::Int(2)));
        assert_eq!(extras.get("c"), Some(&ExtraValue::Bool(false)));
        assert_eq!(extras.get("d"), Some(&ExtraValue::Float(1.5)));
    }
}
