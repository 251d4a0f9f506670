//! SQLite driver implementation using rusqlite
//!
//! rusqlite is synchronous; `run` never awaits while a statement is alive,
//! so the future stays `Send`.

use crate::db::driver::{DatabaseBackend, SessionDriver};
use crate::db::params::{BoundParams, BoundValue};
use crate::db::query::{CellValue, Execution, QueryOutcome, Row};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// SQLite driver
pub struct SqliteDriver {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteDriver {
    /// Open (or create) a SQLite database file
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let p = path.clone();
        let conn = tokio::task::spawn_blocking(move || Connection::open(&p))
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?
            .map_err(|e| SessionError::Connection(format!("Failed to open SQLite database: {}", e)))?;

        tracing::info!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SessionError::Connection(format!("Failed to open SQLite database: {}", e)))?;
        Ok(Self { conn, path: None })
    }

    /// Database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl SessionDriver for SqliteDriver {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn run(&mut self, sql: &str, params: &BoundParams, row_limit: usize) -> Result<Execution> {
        let start = Instant::now();

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| SessionError::Prepare(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let values: Vec<Value> = params.values().iter().map(to_sqlite_value).collect();

        if columns.is_empty() {
            // Statement doesn't return rows (INSERT/UPDATE/DELETE/CREATE/etc.)
            // last_insert_rowid is connection-wide and survives non-inserting statements
            let rowid_before = self.conn.last_insert_rowid();
            let executed = stmt.execute(params_from_iter(values));
            let execution_time = start.elapsed();
            return Ok(match executed {
                Ok(affected) => {
                    let rowid = self.conn.last_insert_rowid();
                    let inserted =
                        affected > 0 && rowid > 0 && (rowid != rowid_before || is_insert(sql));
                    Execution {
                        outcome: QueryOutcome::Done {
                            affected_rows: affected as u64,
                            last_insert_id: inserted.then_some(rowid as u64),
                        },
                        execution_time,
                    }
                }
                Err(e) => Execution::failed(e.to_string(), execution_time),
            });
        }

        let mut raw_rows = match stmt.query(params_from_iter(values)) {
            Ok(rows) => rows,
            Err(e) => return Ok(Execution::failed(e.to_string(), start.elapsed())),
        };

        // The first step is where SQLite actually runs the statement
        let mut rows: Vec<Row> = Vec::new();
        let first = raw_rows.next();
        let execution_time = start.elapsed();
        let mut exhausted = match first {
            Ok(Some(row)) => {
                rows.push(convert_row(row, &columns)?);
                false
            }
            Ok(None) => true,
            Err(e) => return Ok(Execution::failed(e.to_string(), execution_time)),
        };

        while !exhausted && (row_limit == 0 || rows.len() < row_limit) {
            match raw_rows.next().map_err(|e| SessionError::Fetch(e.to_string()))? {
                Some(row) => rows.push(convert_row(row, &columns)?),
                None => exhausted = true,
            }
        }

        Ok(Execution {
            outcome: QueryOutcome::Rows(rows),
            execution_time,
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| SessionError::Connection(e.to_string()))
    }
}

fn is_insert(sql: &str) -> bool {
    let head: String = sql.trim_start().chars().take(7).collect::<String>().to_ascii_uppercase();
    head.starts_with("INSERT") || head.starts_with("REPLACE")
}

fn to_sqlite_value(value: &BoundValue) -> Value {
    match value {
        BoundValue::Text(s) => Value::Text(s.clone()),
        BoundValue::Int(v) => Value::Integer(*v),
        BoundValue::Float(v) => Value::Real(*v),
    }
}

fn convert_row(row: &rusqlite::Row<'_>, columns: &[String]) -> Result<Row> {
    let mut out = Row::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        let val = match row.get_ref(i).map_err(|e| SessionError::Fetch(e.to_string()))? {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(v) => CellValue::Int(v),
            ValueRef::Real(v) => CellValue::Float(v),
            ValueRef::Text(v) => CellValue::String(String::from_utf8_lossy(v).to_string()),
            ValueRef::Blob(v) => CellValue::Binary(v.to_vec()),
        };
        out.push(name.clone(), val);
    }
    Ok(out)
}
