//! Single-row INSERT statement builder

use crate::db::params::Param;
use crate::error::{Result, SessionError};
use serde_json::Value;

/// An `INSERT INTO` statement with one positional placeholder per field.
///
/// Fields and values stay paired in the order they were supplied. Values are
/// not filtered here; unbindable ones are dropped later, at bind time.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertStatement {
    sql: String,
    values: Vec<Param>,
}

impl InsertStatement {
    pub fn new<K: AsRef<str>>(table: &str, fields: impl IntoIterator<Item = (K, Param)>) -> Self {
        let mut names = Vec::new();
        let mut values = Vec::new();
        for (name, value) in fields {
            names.push(format!("`{}`", name.as_ref().replace('`', "``")));
            values.push(value);
        }

        let placeholders = vec!["?"; names.len()].join(",");
        let sql = format!("INSERT INTO {}({}) VALUES({})", table, names.join(","), placeholders);

        Self { sql, values }
    }

    /// Build from a JSON object; anything else is rejected
    pub fn from_json(table: &str, data: &Value) -> Result<Self> {
        let Value::Object(map) = data else {
            return Err(SessionError::InvalidArgument(format!(
                "row data for {} must be an object, got {}",
                table,
                json_kind(data)
            )));
        };

        Ok(Self::new(table, map.iter().map(|(k, v)| (k, Param::from(v)))))
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Param] {
        &self.values
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builds_quoted_fields_and_placeholders() {
        let insert = InsertStatement::from_json("users", &json!({ "name": "Ann", "age": 30 })).unwrap();
        assert_eq!(insert.sql(), "INSERT INTO users(`name`,`age`) VALUES(?,?)");
        assert_eq!(insert.values(), &[Param::Text("Ann".to_string()), Param::Int(30)]);
    }

    #[test]
    fn test_keeps_unbindable_fields_in_field_list() {
        let insert = InsertStatement::from_json("t", &json!({ "a": 1, "b": null })).unwrap();
        assert_eq!(insert.sql(), "INSERT INTO t(`a`,`b`) VALUES(?,?)");
        assert_eq!(insert.values(), &[Param::Int(1), Param::Null]);
    }

    #[test]
    fn test_from_pairs() {
        let insert = InsertStatement::new("logs", [("level", Param::from("warn")), ("n", Param::from(2.0))]);
        assert_eq!(insert.sql(), "INSERT INTO logs(`level`,`n`) VALUES(?,?)");
    }

    #[test]
    fn test_backticks_in_field_names_are_doubled() {
        let insert = InsertStatement::from_json("t", &json!({ "a`b": 1 })).unwrap();
        assert_eq!(insert.sql(), "INSERT INTO t(`a``b`) VALUES(?)");

        let insert = InsertStatement::new("t", [("x`) VALUES(1);--", Param::from(1))]);
        assert_eq!(insert.sql(), "INSERT INTO t(`x``) VALUES(1);--`) VALUES(?)");
    }

    #[test]
    fn test_rejects_non_object() {
        for data in [json!(null), json!([1, 2]), json!("row"), json!(3)] {
            let err = InsertStatement::from_json("users", &data).unwrap_err();
            assert!(matches!(err, SessionError::InvalidArgument(_)));
        }
    }
}
