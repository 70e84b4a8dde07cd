//! Bound-parameter modeling and sanitization
//!
//! Statements are observed with a named snapshot of their bound parameters.
//! Sanitization is total: every value becomes some JSON, never an error.

use chrono::{DateTime, Utc};

/// Placeholder substituted when a value cannot be represented
pub const UNREPRESENTABLE: &str = "<unrepresentable>";

/// A bound parameter value as seen by the audit layer
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    List(Vec<ParamValue>),
    Map(Vec<(String, ParamValue)>),
    Json(serde_json::Value),
}

impl ParamValue {
    /// Convert to JSON for the audit record. Scalars keep their JSON type,
    /// bytes are lossily decoded, timestamps become RFC3339 strings,
    /// non-finite floats become the placeholder.
    pub fn sanitize(&self) -> serde_json::Value {
        match self {
            ParamValue::Null => serde_json::Value::Null,
            ParamValue::Bool(b) => serde_json::Value::Bool(*b),
            ParamValue::Int(i) => serde_json::Value::from(*i),
            ParamValue::Float(f) => {
                if f.is_finite() {
                    serde_json::Value::from(*f)
                } else {
                    serde_json::Value::String(UNREPRESENTABLE.to_string())
                }
            },
            ParamValue::Text(s) => serde_json::Value::String(s.clone()),
            ParamValue::Bytes(b) => {
                serde_json::Value::String(String::from_utf8_lossy(b).into_owned())
            },
            ParamValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            ParamValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.sanitize()).collect())
            },
            ParamValue::Map(entries) => {
                let map = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.sanitize()))
                    .collect();
                serde_json::Value::Object(map)
            },
            ParamValue::Json(v) => v.clone(),
        }
    }

    /// Best-effort integer view, used for target-id extraction
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => ParamValue::Null,
        }
    }
}

/// Named parameter snapshot for one statement
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sanitize the whole snapshot into one JSON object
    pub fn sanitize(&self) -> serde_json::Value {
        let map = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.sanitize()))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_keep_json_types() {
        assert_eq!(ParamValue::Int(7).sanitize(), serde_json::json!(7));
        assert_eq!(ParamValue::Bool(true).sanitize(), serde_json::json!(true));
        assert_eq!(ParamValue::Null.sanitize(), serde_json::Value::Null);
        assert_eq!(
            ParamValue::Text("x".into()).sanitize(),
            serde_json::json!("x")
        );
    }

    #[test]
    fn test_non_finite_float_uses_placeholder() {
        assert_eq!(
            ParamValue::Float(f64::NAN).sanitize(),
            serde_json::json!(UNREPRESENTABLE)
        );
        assert_eq!(ParamValue::Float(1.5).sanitize(), serde_json::json!(1.5));
    }

    #[test]
    fn test_bytes_lossy_decode() {
        let value = ParamValue::Bytes(vec![0x68, 0x69, 0xFF]);
        assert_eq!(value.sanitize(), serde_json::json!("hi\u{FFFD}"));
    }

    #[test]
    fn test_nested_structures() {
        let value = ParamValue::Map(vec![
            ("ids".into(), ParamValue::List(vec![ParamValue::Int(1)])),
            ("name".into(), ParamValue::Text("GA".into())),
        ]);
        assert_eq!(
            value.sanitize(),
            serde_json::json!({"ids": [1], "name": "GA"})
        );
    }

    #[test]
    fn test_params_snapshot() {
        let params = Params::new()
            .push("id", 42i64)
            .push("email", "a@b.c")
            .push("deleted", Option::<i64>::None);
        assert_eq!(params.get("id").and_then(|v| v.as_i64()), Some(42));
        assert_eq!(
            params.sanitize(),
            serde_json::json!({"id": 42, "email": "a@b.c", "deleted": null})
        );
    }
}
