//! MySQL driver implementation using sqlx
//!
//! Statements are prepared explicitly so a preparation error can be told
//! apart from an execution error.

use crate::config::SessionConfig;
use crate::db::driver::{DatabaseBackend, SessionDriver};
use crate::db::params::{BoundParams, BoundValue};
use crate::db::query::{CellValue, Execution, QueryOutcome, Row};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row as _, Statement, TypeInfo, ValueRef};
use std::time::Instant;

/// MySQL driver
pub struct MySqlDriver {
    conn: MySqlConnection,
}

impl MySqlDriver {
    /// Validate the config, connect, and apply the charset if one is set
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password);
        if !config.database.is_empty() {
            options = options.database(&config.database);
        }
        if let Some(socket) = &config.socket {
            options = options.socket(socket);
        }

        let mut conn = options
            .connect()
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;

        if let Some(charset) = &config.charset {
            let set_names = format!("SET NAMES {}", charset);
            Executor::execute(&mut conn, set_names.as_str())
                .await
                .map_err(|e| SessionError::Connection(format!("Failed to set charset {}: {}", charset, e)))?;
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to mysql"
        );
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionDriver for MySqlDriver {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySql
    }

    async fn run(&mut self, sql: &str, params: &BoundParams, row_limit: usize) -> Result<Execution> {
        let start = Instant::now();

        let stmt = Executor::prepare(&mut self.conn, sql)
            .await
            .map_err(|e| SessionError::Prepare(e.to_string()))?;

        let mut query = stmt.query();
        for value in params.values() {
            query = match value {
                BoundValue::Text(s) => query.bind(s.clone()),
                BoundValue::Int(v) => query.bind(*v),
                BoundValue::Float(v) => query.bind(*v),
            };
        }

        if stmt.columns().is_empty() {
            let executed = query.execute(&mut self.conn).await;
            let execution_time = start.elapsed();
            return Ok(match executed {
                Ok(done) => Execution {
                    outcome: QueryOutcome::Done {
                        affected_rows: done.rows_affected(),
                        last_insert_id: Some(done.last_insert_id()).filter(|id| *id > 0),
                    },
                    execution_time,
                },
                Err(e) => Execution::failed(e.to_string(), execution_time),
            });
        }

        let mut stream = query.fetch(&mut self.conn);

        // The server reports execution errors with the first packet
        let mut rows: Vec<Row> = Vec::new();
        let first = stream.try_next().await;
        let execution_time = start.elapsed();
        let mut exhausted = match first {
            Ok(Some(row)) => {
                rows.push(convert_row(&row)?);
                false
            }
            Ok(None) => true,
            Err(e) => return Ok(Execution::failed(e.to_string(), execution_time)),
        };

        while !exhausted && (row_limit == 0 || rows.len() < row_limit) {
            match stream
                .try_next()
                .await
                .map_err(|e| SessionError::Fetch(e.to_string()))?
            {
                Some(row) => rows.push(convert_row(&row)?),
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
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))
    }
}

fn convert_row(row: &MySqlRow) -> Result<Row> {
    let mut out = Row::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        let value = extract_cell_value(row, i, col.type_info().name())
            .map_err(|e| SessionError::Fetch(format!("column {}: {}", col.name(), e)))?;
        out.push(col.name(), value);
    }
    Ok(out)
}

/// How a column is decoded, picked from its MySQL type name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeAs {
    Null,
    Int,
    Unsigned,
    Float,
    Double,
    Decimal,
    DateTime,
    Date,
    Time,
    Binary,
    Text,
}

fn decode_as(type_name: &str) -> DecodeAs {
    match type_name {
        "NULL" => DecodeAs::Null,
        // BOOLEAN is TINYINT(1), which can hold any tinyint value
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => DecodeAs::Int,
        t if t.ends_with(" UNSIGNED") => DecodeAs::Unsigned,
        "FLOAT" => DecodeAs::Float,
        "DOUBLE" => DecodeAs::Double,
        "DECIMAL" => DecodeAs::Decimal,
        "DATETIME" | "TIMESTAMP" => DecodeAs::DateTime,
        "DATE" => DecodeAs::Date,
        "TIME" => DecodeAs::Time,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => DecodeAs::Binary,
        _ => DecodeAs::Text,
    }
}

/// Decode one column; a value that fails to decode is an error, never a NULL.
fn extract_cell_value(row: &MySqlRow, index: usize, type_name: &str) -> std::result::Result<CellValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(CellValue::Null);
    }

    let value = match decode_as(type_name) {
        DecodeAs::Null => CellValue::Null,
        DecodeAs::Int => CellValue::Int(row.try_get_unchecked::<i64, _>(index)?),
        DecodeAs::Unsigned => {
            let v = row.try_get_unchecked::<u64, _>(index)?;
            match i64::try_from(v) {
                Ok(v) => CellValue::Int(v),
                Err(_) => CellValue::String(v.to_string()),
            }
        }
        DecodeAs::Float => CellValue::Float(row.try_get_unchecked::<f32, _>(index)? as f64),
        DecodeAs::Double => CellValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        DecodeAs::Decimal => CellValue::String(row.try_get_unchecked::<Decimal, _>(index)?.to_string()),
        DecodeAs::DateTime => CellValue::DateTime(
            row.try_get_unchecked::<NaiveDateTime, _>(index)?
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ),
        DecodeAs::Date => CellValue::DateTime(
            row.try_get_unchecked::<NaiveDate, _>(index)?
                .format("%Y-%m-%d")
                .to_string(),
        ),
        DecodeAs::Time => CellValue::DateTime(
            row.try_get_unchecked::<NaiveTime, _>(index)?
                .format("%H:%M:%S")
                .to_string(),
        ),
        DecodeAs::Binary => CellValue::Binary(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        // Text in a non-UTF-8 connection charset comes back as raw bytes
        DecodeAs::Text => match row.try_get_unchecked::<String, _>(index) {
            Ok(s) => CellValue::String(s),
            Err(_) => CellValue::Binary(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        },
    };

    Ok(value)
}
