//! Error taxonomy shared by every task.
//!
//! All variants abort the running task. Nothing here is retried: the
//! orchestrator decides whether to re-run the whole task.

use thiserror::Error;

/// Failure of a task invocation.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The staged source cannot be opened or read.
    #[error("source unavailable: {uri}: {reason}")]
    SourceUnavailable { uri: String, reason: String },

    /// Statement, chunk size, URL, URI or credentials are missing or invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A line of the source is not a serialized record.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// The database rejected or failed a statement.
    #[error("statement execution failed: {0}")]
    StatementExecutionFailure(String),

    /// The database connection could not be established or was lost.
    #[error("connectivity failure: {0}")]
    ConnectivityFailure(String),

    /// The surrounding task was cancelled.
    #[error("task cancelled")]
    Cancelled,

    #[error("task timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

impl TaskError {
    pub fn source_unavailable(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

impl From<neo4rs::Error> for TaskError {
    fn from(err: neo4rs::Error) -> Self {
        match err {
            // A refused or dropped socket surfaces as an IO error; pool
            // exhaustion or a failed handshake as `ConnectionError`.
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                Self::ConnectivityFailure(err.to_string())
            }
            neo4rs::Error::UrlParseError(_)
            | neo4rs::Error::UnsupportedScheme(_)
            | neo4rs::Error::InvalidDnsName(_) => Self::InvalidConfiguration(err.to_string()),
            other => Self::StatementExecutionFailure(other.to_string()),
        }
    }
}
