//! In-memory mock implementation of GraphConnector for testing.
//!
//! Writes made inside a transaction stay private to it until commit, so
//! tests can check that a rolled-back batch leaves nothing visible.
//! Conditionally compiled with `#[cfg(test)]`.

use super::traits::{GraphConnector, GraphTransaction};
use crate::error::TaskError;
use crate::storage::Record;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type ResultRows = Arc<dyn Fn(&[Record]) -> u64 + Send + Sync>;

/// Kind of error a scripted failure raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Statement,
    Connectivity,
}

impl MockFailure {
    fn to_error(self, chunk: usize) -> TaskError {
        match self {
            Self::Statement => {
                TaskError::StatementExecutionFailure(format!("chunk {chunk} rejected"))
            }
            Self::Connectivity => {
                TaskError::ConnectivityFailure(format!("connection lost at chunk {chunk}"))
            }
        }
    }
}

#[derive(Default)]
struct MockState {
    committed: Vec<Record>,
    executed: Vec<Vec<Record>>,
    statements: Vec<String>,
    begun: usize,
    commits: usize,
    rollbacks: usize,
}

/// In-memory mock implementation of GraphConnector for testing.
pub struct MockGraph {
    state: Arc<Mutex<MockState>>,
    rows: Vec<Record>,
    result_rows: ResultRows,
    fail_on_chunk: Option<(usize, MockFailure)>,
    fail_run: Option<MockFailure>,
    fail_rollback: bool,
    chunk_delay: Option<Duration>,
    commit_delay: Option<Duration>,
}

impl MockGraph {
    /// Create a mock whose statements return one row per input record.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            rows: Vec::new(),
            result_rows: Arc::new(|chunk| chunk.len() as u64),
            fail_on_chunk: None,
            fail_run: None,
            fail_rollback: false,
            chunk_delay: None,
            commit_delay: None,
        }
    }

    /// Rows returned by auto-commit `run` calls.
    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    /// Override how many result rows a chunk reports.
    pub fn with_result_rows(mut self, f: impl Fn(&[Record]) -> u64 + Send + Sync + 'static) -> Self {
        self.result_rows = Arc::new(f);
        self
    }

    /// Fail the `n`-th chunk (1-based) of every transaction.
    pub fn failing_on_chunk(mut self, n: usize, kind: MockFailure) -> Self {
        self.fail_on_chunk = Some((n, kind));
        self
    }

    pub fn failing_run(mut self, kind: MockFailure) -> Self {
        self.fail_run = Some(kind);
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    /// Records visible to readers, i.e. written by committed transactions.
    pub async fn committed(&self) -> Vec<Record> {
        self.state.lock().await.committed.clone()
    }

    /// Every chunk handed to the database, committed or not, in order.
    pub async fn executed_chunks(&self) -> Vec<Vec<Record>> {
        self.state.lock().await.executed.clone()
    }

    pub async fn statements(&self) -> Vec<String> {
        self.state.lock().await.statements.clone()
    }

    pub async fn begun(&self) -> usize {
        self.state.lock().await.begun
    }

    pub async fn commits(&self) -> usize {
        self.state.lock().await.commits
    }

    pub async fn rollbacks(&self) -> usize {
        self.state.lock().await.rollbacks
    }
}

#[async_trait]
impl GraphConnector for MockGraph {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, TaskError> {
        self.state.lock().await.begun += 1;
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
            result_rows: Arc::clone(&self.result_rows),
            fail_on_chunk: self.fail_on_chunk,
            fail_rollback: self.fail_rollback,
            chunk_delay: self.chunk_delay,
            commit_delay: self.commit_delay,
            pending: Vec::new(),
            chunks: 0,
        }))
    }

    async fn run(&self, statement: &str) -> Result<Vec<Record>, TaskError> {
        self.state.lock().await.statements.push(statement.to_string());
        if let Some(kind) = self.fail_run {
            return Err(kind.to_error(0));
        }
        Ok(self.rows.clone())
    }
}

struct MockTransaction {
    state: Arc<Mutex<MockState>>,
    result_rows: ResultRows,
    fail_on_chunk: Option<(usize, MockFailure)>,
    fail_rollback: bool,
    chunk_delay: Option<Duration>,
    commit_delay: Option<Duration>,
    pending: Vec<Record>,
    chunks: usize,
}

#[async_trait]
impl GraphTransaction for MockTransaction {
    async fn run_chunk(&mut self, statement: &str, chunk: &[Record]) -> Result<u64, TaskError> {
        if let Some(delay) = self.chunk_delay {
            tokio::time::sleep(delay).await;
        }
        self.chunks += 1;

        {
            let mut state = self.state.lock().await;
            state.executed.push(chunk.to_vec());
            state.statements.push(statement.to_string());
        }

        if let Some((n, kind)) = self.fail_on_chunk {
            if n == self.chunks {
                return Err(kind.to_error(n));
            }
        }

        self.pending.extend_from_slice(chunk);
        Ok((self.result_rows)(chunk))
    }

    async fn commit(self: Box<Self>) -> Result<(), TaskError> {
        let MockTransaction {
            state,
            pending,
            commit_delay,
            ..
        } = *self;
        if let Some(delay) = commit_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = state.lock().await;
        state.committed.extend(pending);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TaskError> {
        self.state.lock().await.rollbacks += 1;
        if self.fail_rollback {
            return Err(TaskError::ConnectivityFailure("rollback failed".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::records;

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let graph = MockGraph::new();
        let mut tx = graph.begin().await.unwrap();
        let rows = tx.run_chunk("UNWIND $props AS p CREATE (n)", &records(3)).await.unwrap();
        assert_eq!(rows, 3);
        assert!(graph.committed().await.is_empty());

        tx.commit().await.unwrap();
        assert_eq!(graph.committed().await.len(), 3);
        assert_eq!(graph.commits().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_pending() {
        let graph = MockGraph::new();
        let mut tx = graph.begin().await.unwrap();
        tx.run_chunk("UNWIND $props AS p CREATE (n)", &records(2)).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(graph.committed().await.is_empty());
        assert_eq!(graph.executed_chunks().await.len(), 1);
        assert_eq!(graph.rollbacks().await, 1);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let graph = MockGraph::new().failing_on_chunk(2, MockFailure::Connectivity);
        let mut tx = graph.begin().await.unwrap();
        assert!(tx.run_chunk("s", &records(1)).await.is_ok());
        let err = tx.run_chunk("s", &records(1)).await.unwrap_err();
        assert!(matches!(err, TaskError::ConnectivityFailure(_)));
    }
}
