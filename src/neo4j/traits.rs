//! GraphConnector / GraphTransaction trait definitions
//!
//! Abstract interface over the graph database driver, enabling testing with
//! the in-memory mock and keeping task logic independent of neo4rs.

use crate::error::TaskError;
use crate::storage::Record;
use async_trait::async_trait;

/// Name of the bind variable a batch statement receives each chunk under.
pub const CHUNK_PARAMETER: &str = "props";

/// Entry point to a graph database.
#[async_trait]
pub trait GraphConnector: Send + Sync {
    /// Open a new explicit transaction.
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, TaskError>;

    /// Run a statement in an auto-commit transaction and collect every row.
    ///
    /// Rows are keyed by column name.
    async fn run(&self, statement: &str) -> Result<Vec<Record>, TaskError>;
}

/// An open transaction. Closed exactly once, by `commit` or `rollback`.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Execute `statement` with `chunk` bound to [`CHUNK_PARAMETER`],
    /// returning the number of result rows.
    async fn run_chunk(&mut self, statement: &str, chunk: &[Record]) -> Result<u64, TaskError>;

    async fn commit(self: Box<Self>) -> Result<(), TaskError>;

    async fn rollback(self: Box<Self>) -> Result<(), TaskError>;
}
