//! Statement parameters and the filter that decides what gets bound
//!
//! Only text, integer and floating-point values are ever bound. Anything else
//! handed to a query is dropped from both the type signature and the bound
//! value list without raising an error.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A value supplied by the caller for a positional placeholder
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
}

/// Type code of a bindable value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindType {
    Text,
    Int,
    Float,
}

impl BindType {
    /// Single-letter code used in the type signature
    pub fn code(self) -> char {
        match self {
            BindType::Text => 's',
            BindType::Int => 'i',
            BindType::Float => 'd',
        }
    }
}

/// A value that survived filtering
#[derive(Clone, Debug, PartialEq)]
pub enum BoundValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl BoundValue {
    pub fn bind_type(&self) -> BindType {
        match self {
            BoundValue::Text(_) => BindType::Text,
            BoundValue::Int(_) => BindType::Int,
            BoundValue::Float(_) => BindType::Float,
        }
    }
}

impl Param {
    /// The bindable form of this value, if it has one
    pub fn to_bound(&self) -> Option<BoundValue> {
        match self {
            Param::Text(s) => Some(BoundValue::Text(s.clone())),
            Param::Int(v) => Some(BoundValue::Int(*v)),
            Param::Float(v) => Some(BoundValue::Float(*v)),
            Param::Null | Param::Bool(_) | Param::Bytes(_) | Param::Json(_) => None,
        }
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Param::Bytes(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Null)
    }
}

impl From<&Value> for Param {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Param::Int(i)
                } else {
                    Param::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => Param::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Param::Json(v.clone()),
        }
    }
}

/// Parameters after filtering: signature plus positional values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundParams {
    signature: String,
    values: Vec<BoundValue>,
}

impl BoundParams {
    /// Keep the bindable values, in order, and record their type codes
    pub fn filter(params: &[Param]) -> Self {
        let values: Vec<BoundValue> = params.iter().filter_map(Param::to_bound).collect();
        let signature = values.iter().map(|v| v.bind_type().code()).collect();
        Self { signature, values }
    }

    /// Type codes of the bound values, e.g. `"sid"`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Count `?` placeholders that sit outside quoted literals and identifiers
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_pattern()
        .find_iter(sql)
        .filter(|m| m.as_str() == "?")
        .count()
}

/// Quoted literals and identifiers are matched whole so a `?` inside them is skipped
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|`[^`]*`|\?"#)
            .expect("placeholder pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_codes() {
        let bound = BoundParams::filter(&["x".into(), 7.into(), 2.5.into()]);
        assert_eq!(bound.signature(), "sid");
        assert_eq!(
            bound.values(),
            &[
                BoundValue::Text("x".to_string()),
                BoundValue::Int(7),
                BoundValue::Float(2.5)
            ]
        );
    }

    #[test]
    fn test_unsupported_values_are_dropped() {
        let params = vec![
            Param::Null,
            Param::from("keep"),
            Param::Bool(true),
            Param::Bytes(vec![1, 2]),
            Param::Json(json!([1])),
            Param::from(3),
        ];
        let bound = BoundParams::filter(&params);
        assert_eq!(bound.signature(), "si");
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn test_all_dropped_binds_nothing() {
        let bound = BoundParams::filter(&[Param::Null, Param::Bool(false)]);
        assert!(bound.is_empty());
        assert_eq!(bound.signature(), "");
    }

    #[test]
    fn test_option_maps_none_to_null() {
        assert_eq!(Param::from(None::<i64>), Param::Null);
        assert_eq!(Param::from(Some("a")), Param::Text("a".to_string()));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Param::from(&json!("Ann")), Param::Text("Ann".to_string()));
        assert_eq!(Param::from(&json!(30)), Param::Int(30));
        assert_eq!(Param::from(&json!(1.5)), Param::Float(1.5));
        assert_eq!(Param::from(&json!(null)), Param::Null);
        assert_eq!(Param::from(&json!(true)), Param::Bool(true));
        assert!(matches!(Param::from(&json!({"a": 1})), Param::Json(_)));
    }

    #[test]
    fn test_count_placeholders_skips_literals() {
        assert_eq!(count_placeholders("SELECT ? AS a, ? AS b"), 2);
        assert_eq!(count_placeholders("SELECT '?' AS q, ? AS b"), 1);
        assert_eq!(count_placeholders("SELECT `a?` FROM t WHERE x = \"?\""), 0);
        assert_eq!(count_placeholders("SELECT 'it\\'s ?' , ?"), 1);
    }

    #[test]
    fn test_placeholder_pattern_compiled_once() {
        assert!(std::ptr::eq(placeholder_pattern(), placeholder_pattern()));
        assert_eq!(count_placeholders("?"), 1);
        assert_eq!(count_placeholders("SELECT ?, ?"), 2);
    }
}
