//! Result types shared by all session drivers

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Represents a cell value in the result set
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(String),
    Binary(Vec<u8>),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(v) => write!(f, "{}", v),
            CellValue::DateTime(v) => write!(f, "{}", v),
            CellValue::Binary(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

/// One result row: field names in result-metadata order, each with its value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a field. A repeated name replaces the earlier value in place,
    /// the way an associative fetch keeps the last column of that name.
    pub fn push(&mut self, name: impl Into<String>, value: CellValue) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Result of one `query` call.
///
/// `Rows` is a statement with a result set (possibly empty), `Done` a
/// statement without one, `Failed` a statement that prepared but did not
/// execute.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Done {
        affected_rows: u64,
        last_insert_id: Option<u64>,
    },
    Failed {
        reason: String,
    },
}

impl QueryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed { .. })
    }

    pub fn is_success(&self) -> bool {
        !self.is_failed()
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryOutcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryOutcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOutcome::Rows(_) => "rows",
            QueryOutcome::Done { .. } => "done",
            QueryOutcome::Failed { .. } => "failed",
        }
    }
}

/// What a driver hands back for one statement
#[derive(Clone, Debug)]
pub struct Execution {
    pub outcome: QueryOutcome,
    /// Time from just before preparation to just after execution
    pub execution_time: Duration,
}

impl Execution {
    pub fn failed(reason: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            outcome: QueryOutcome::Failed {
                reason: reason.into(),
            },
            execution_time,
        }
    }
}

/// One successfully executed query
#[derive(Clone, Debug, PartialEq)]
pub struct QueryLogEntry {
    query: String,
    duration: Duration,
}

impl QueryLogEntry {
    pub fn new(query: impl Into<String>, duration: Duration) -> Self {
        Self {
            query: query.into(),
            duration,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

impl Serialize for QueryLogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = serializer.serialize_struct("QueryLogEntry", 2)?;
        entry.serialize_field("query", &self.query)?;
        entry.serialize_field("duration", &self.duration_secs())?;
        entry.end()
    }
}

// Helper for hex encoding binary data
mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_keeps_column_order() {
        let mut row = Row::new();
        row.push("name", CellValue::String("Ann".to_string()));
        row.push("age", CellValue::Int(30));

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(row.get("age"), Some(&CellValue::Int(30)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_row_duplicate_name_keeps_last_value() {
        let mut row = Row::new();
        row.push("id", CellValue::Int(1));
        row.push("id", CellValue::Int(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("id"), Some(&CellValue::Int(2)));
    }

    #[test]
    fn test_row_serializes_as_object() {
        let mut row = Row::new();
        row.push("b", CellValue::Int(1));
        row.push("a", CellValue::Null);
        row.push("c", CellValue::Float(0.5));

        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"b":1,"a":null,"c":0.5}"#);
    }

    #[test]
    fn test_log_entry_serializes_seconds() {
        let entry = QueryLogEntry::new("SELECT 1", Duration::from_millis(1500));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "query": "SELECT 1", "duration": 1.5 })
        );
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Binary(vec![0xAB, 0x01]).to_string(), "0xAB01");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_outcome_accessors() {
        let done = QueryOutcome::Done {
            affected_rows: 1,
            last_insert_id: Some(7),
        };
        assert!(done.is_success());
        assert!(done.rows().is_none());

        let failed = QueryOutcome::Failed {
            reason: "boom".to_string(),
        };
        assert!(failed.is_failed());
        assert_eq!(failed.kind(), "failed");

        let rows = QueryOutcome::Rows(vec![Row::new()]);
        assert_eq!(rows.rows().map(|r| r.len()), Some(1));
    }
}
