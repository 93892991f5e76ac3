//! Session attribute values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key carrying the lookup status in an attribute snapshot.
pub const MESSAGE_KEY: &str = "message";
/// Status reported when the session is live.
pub const SESSION_FOUND: &str = "Session found";
/// Status reported when the session is unknown or already evicted.
pub const SESSION_NOT_FOUND: &str = "Session not found";

/// Attribute name to value mapping held by a session.
pub type Attributes = HashMap<String, AttributeValue>;

/// A single attribute value.
///
/// Sessions hold heterogeneous values; the variants cover what request
/// handlers typically store, with [`AttributeValue::Json`] as an escape
/// hatch for anything structured.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Get the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a boolean if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a timestamp if it is one.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversions() {
        assert_eq!(AttributeValue::from("abc").as_str(), Some("abc"));
        assert_eq!(AttributeValue::from(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::from(7), AttributeValue::Integer(7));
        assert!(AttributeValue::from(1.5).as_str().is_none());
    }

    #[test]
    fn test_serializes_untagged() {
        let mut attrs = Attributes::new();
        attrs.insert("ssoCheck".into(), true.into());
        attrs.insert("userId".into(), "E45FCEE".into());
        attrs.insert("visits".into(), 3.into());
        attrs.insert("prefs".into(), json!({"theme": "dark"}).into());

        let value = serde_json::to_value(&attrs).unwrap();
        assert_eq!(value["ssoCheck"], json!(true));
        assert_eq!(value["userId"], json!("E45FCEE"));
        assert_eq!(value["visits"], json!(3));
        assert_eq!(value["prefs"]["theme"], json!("dark"));
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = DateTime::parse_from_rfc3339("2026-10-18T05:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = serde_json::to_value(AttributeValue::from(ts)).unwrap();
        assert_eq!(value, json!("2026-10-18T05:00:00Z"));
    }
}
