//! Error taxonomy shared by the session and its drivers

use thiserror::Error;

/// Errors surfaced to callers of a [`Session`](crate::Session).
///
/// A statement that prepares but fails to execute is not an error for
/// [`Session::query`](crate::Session::query); it comes back as
/// [`QueryOutcome::Failed`](crate::QueryOutcome::Failed). Only
/// [`Session::try_query`](crate::Session::try_query) turns it into
/// [`SessionError::Execution`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing or malformed connection parameters
    #[error("Invalid connection parameters: {0}")]
    Configuration(String),

    /// The driver could not connect, or could not apply the charset
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Bad input to a helper such as `insert_row`
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The statement could not be prepared
    #[error("Failed to prepare statement: {0}")]
    Prepare(String),

    /// The statement was prepared but did not execute
    #[error("Statement execution failed: {0}")]
    Execution(String),

    /// A row could not be read after execution succeeded
    #[error("Failed to fetch row: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
