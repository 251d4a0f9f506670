//! Session driver abstraction trait
//!
//! Defines the interface every database backend must implement so a
//! [`Session`](crate::Session) can own it.

use crate::db::{BoundParams, Execution};
use crate::error::Result;
use async_trait::async_trait;

/// Which database backend is in use
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DatabaseBackend {
    MySql,
    Sqlite,
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackend::MySql => write!(f, "MySQL"),
            DatabaseBackend::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Trait that all session drivers must implement.
///
/// A driver owns exactly one connection. Methods take `&mut self`, so a
/// driver is never shared between callers.
#[async_trait]
pub trait SessionDriver: Send {
    /// Which backend this driver represents
    fn backend(&self) -> DatabaseBackend;

    /// Prepare `sql`, bind `params` positionally, execute, and collect up to
    /// `row_limit` rows (0 for all).
    ///
    /// Preparation errors are returned as `Err`. Binding and execution
    /// errors come back as a `Failed` outcome.
    async fn run(&mut self, sql: &str, params: &BoundParams, row_limit: usize) -> Result<Execution>;

    /// Release the connection
    async fn close(self: Box<Self>) -> Result<()>;
}
