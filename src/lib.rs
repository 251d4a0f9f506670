//! Single-connection SQL session - Library
//!
//! A [`Session`] owns one database connection and offers a parameterized
//! query helper, a single-row fetch helper, a row-insert builder, and a log
//! of every successfully executed query with its duration.
//!
//! ```no_run
//! use serde_json::json;
//! use sql_session::{Session, SessionConfig};
//!
//! # async fn run() -> sql_session::Result<()> {
//! let config = SessionConfig::new("127.0.0.1").username("app").database("shop");
//! let mut session = Session::connect(&config).await?;
//!
//! session.insert_row("users", &json!({ "name": "Ann", "age": 30 })).await?;
//! let row = session
//!     .query_get_row("SELECT name FROM users WHERE age > ?", &[18.into()])
//!     .await?;
//!
//! for entry in session.queries_data() {
//!     println!("{:.4}s  {}", entry.duration_secs(), entry.query());
//! }
//! # let _ = row;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
mod session;

pub use config::{ConfigOverrides, SessionConfig};
pub use db::{
    BoundParams, CellValue, DatabaseBackend, InsertStatement, Param, QueryLogEntry, QueryOutcome,
    Row, SessionDriver,
};
pub use error::{Result, SessionError};
pub use session::Session;
