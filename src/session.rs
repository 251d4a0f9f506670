//! The database session: one owned connection plus a log of executed queries

use crate::config::SessionConfig;
use crate::db::mysql::MySqlDriver;
use crate::db::sqlite::SqliteDriver;
use crate::db::{
    count_placeholders, BoundParams, DatabaseBackend, InsertStatement, Param, QueryLogEntry,
    QueryOutcome, Row, SessionDriver,
};
use crate::error::{Result, SessionError};
use serde_json::Value;
use std::path::PathBuf;

/// A single database connection with parameterized query helpers.
///
/// Every operation takes `&mut self`; a session has one owner and is never
/// used from two places at once. The connection is released by [`close`] or
/// when the session is dropped. There is no reconnect: a lost connection
/// shows up as a failure on the next operation.
///
/// [`close`]: Session::close
pub struct Session {
    driver: Box<dyn SessionDriver>,
    queries: Vec<QueryLogEntry>,
}

impl Session {
    /// Connect to MySQL.
    ///
    /// An empty host fails with [`SessionError::Configuration`] before any
    /// network activity.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let driver = MySqlDriver::connect(config).await?;
        Ok(Self::from_driver(Box::new(driver)))
    }

    /// Open (or create) a SQLite database file
    pub async fn open_sqlite(path: impl Into<PathBuf>) -> Result<Self> {
        let driver = SqliteDriver::open(path).await?;
        Ok(Self::from_driver(Box::new(driver)))
    }

    /// Open a private in-memory SQLite database
    pub fn open_sqlite_in_memory() -> Result<Self> {
        let driver = SqliteDriver::open_in_memory()?;
        Ok(Self::from_driver(Box::new(driver)))
    }

    /// Wrap an already connected driver
    pub fn from_driver(driver: Box<dyn SessionDriver>) -> Self {
        Self {
            driver,
            queries: Vec::new(),
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.driver.backend()
    }

    /// Prepare, bind and execute `sql`.
    ///
    /// Only text, integer and float parameters are bound; the rest are
    /// skipped, so a statement whose placeholders outnumber the surviving
    /// values runs with missing bindings. `row_limit` caps the number of rows
    /// collected, 0 meaning all of them.
    ///
    /// A statement that fails to execute yields [`QueryOutcome::Failed`] and
    /// is not logged. Preparation errors are returned as `Err`.
    pub async fn query(&mut self, sql: &str, params: &[Param], row_limit: usize) -> Result<QueryOutcome> {
        let bound = BoundParams::filter(params);

        let placeholders = count_placeholders(sql);
        if placeholders != bound.len() {
            tracing::warn!(
                placeholders,
                bound = bound.len(),
                supplied = params.len(),
                "parameter count does not match placeholders"
            );
        }

        let execution = self.driver.run(sql, &bound, row_limit).await?;

        if let QueryOutcome::Failed { reason } = &execution.outcome {
            tracing::warn!(%reason, sql, "statement execution failed");
            return Ok(execution.outcome);
        }

        tracing::debug!(
            sql,
            signature = bound.signature(),
            duration_ms = execution.execution_time.as_secs_f64() * 1000.0,
            outcome = execution.outcome.kind(),
            "query executed"
        );
        self.queries.push(QueryLogEntry::new(sql, execution.execution_time));

        Ok(execution.outcome)
    }

    /// Like [`query`](Session::query), but an execution failure is an
    /// [`SessionError::Execution`] instead of a `Failed` outcome.
    pub async fn try_query(&mut self, sql: &str, params: &[Param], row_limit: usize) -> Result<QueryOutcome> {
        match self.query(sql, params, row_limit).await? {
            QueryOutcome::Failed { reason } => Err(SessionError::Execution(reason)),
            outcome => Ok(outcome),
        }
    }

    /// First row of the result, or `None` when there is no row to return
    pub async fn query_get_row(&mut self, sql: &str, params: &[Param]) -> Result<Option<Row>> {
        let outcome = self.query(sql, params, 1).await?;
        Ok(outcome.into_rows().and_then(|rows| rows.into_iter().next()))
    }

    /// Insert one record built from a JSON object's keys and values
    pub async fn insert_row(&mut self, table: &str, data: &Value) -> Result<QueryOutcome> {
        let insert = InsertStatement::from_json(table, data)?;
        self.query(insert.sql(), insert.values(), 0).await
    }

    /// Every successfully executed query, oldest first
    pub fn queries_data(&self) -> &[QueryLogEntry] {
        &self.queries
    }

    /// Release the connection
    pub async fn close(self) -> Result<()> {
        let backend = self.driver.backend();
        self.driver.close().await?;
        tracing::info!(%backend, queries = self.queries.len(), "session closed");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.driver.backend())
            .field("queries", &self.queries.len())
            .finish()
    }
}
