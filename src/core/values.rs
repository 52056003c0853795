//! Server-typed scalar values (facet values, PowerQuery cells)

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar whose type is decided by the server at query time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl DynamicValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Null => f.write_str("null"),
            DynamicValue::Bool(b) => write!(f, "{}", b),
            DynamicValue::Number(n) => write!(f, "{}", n),
            DynamicValue::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_each_variant() {
        let values: Vec<DynamicValue> =
            serde_json::from_str(r#"[null, true, 4.5, 7, "web-01"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                DynamicValue::Null,
                DynamicValue::Bool(true),
                DynamicValue::Number(4.5),
                DynamicValue::Number(7.0),
                DynamicValue::String("web-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(DynamicValue::String("a".into()).as_str(), Some("a"));
        assert_eq!(DynamicValue::Number(1.5).as_f64(), Some(1.5));
        assert_eq!(DynamicValue::Bool(false).as_bool(), Some(false));
        assert!(DynamicValue::default().is_null());
        assert_eq!(DynamicValue::Number(2.0).as_str(), None);
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert!(serde_json::from_str::<DynamicValue>(r#"{"a": 1}"#).is_err());
    }
}
