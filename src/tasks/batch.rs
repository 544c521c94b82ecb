//! Chunked UNWIND batch import
//!
//! Streams line-delimited records from staged storage, groups them into
//! fixed-size chunks and runs the statement once per chunk with the chunk
//! bound to `$props`. Every chunk shares one transaction: the batch either
//! commits as a whole or is rolled back as a whole.

use crate::error::TaskError;
use crate::metrics::Counter;
use crate::neo4j::GraphTransaction;
use crate::storage::{read_records, Record};
use crate::TaskContext;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Records per chunk when none is configured
pub const DEFAULT_CHUNK: i64 = 1000;

/// Upper bound on the capacity reserved up front for one chunk
const MAX_PREALLOC: usize = 4096;

/// Batch task settings, fully rendered by the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchTask {
    /// Staged-storage URI of the line-delimited source
    pub from: String,
    /// Statement expecting the chunk under `$props`
    pub query: String,
    /// Records per chunk. `None` means the value failed to render.
    #[serde(default = "default_chunk")]
    pub chunk: Option<i64>,
    #[serde(default)]
    pub timeout: Option<Duration>,
}

fn default_chunk() -> Option<i64> {
    Some(DEFAULT_CHUNK)
}

/// Final tally, produced only once the transaction has committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutput {
    /// Statements executed, one per chunk
    pub row_count: u64,
    /// Result rows summed over all chunks
    pub updated_count: u64,
}

impl BatchTask {
    pub fn new(from: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            query: query.into(),
            chunk: Some(DEFAULT_CHUNK),
            timeout: None,
        }
    }

    pub fn with_chunk(mut self, chunk: i64) -> Self {
        self.chunk = Some(chunk);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the settings and return the chunk size.
    pub fn validate(&self) -> Result<NonZeroUsize, TaskError> {
        if self.query.trim().is_empty() {
            return Err(TaskError::invalid("batch statement is empty"));
        }
        if self.from.trim().is_empty() {
            return Err(TaskError::invalid("source URI is empty"));
        }
        let chunk = self
            .chunk
            .ok_or_else(|| TaskError::invalid("chunk size is required"))?;
        usize::try_from(chunk)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| TaskError::invalid(format!("chunk size must be positive, got {chunk}")))
    }

    /// Run the batch.
    ///
    /// Configuration is checked before anything is opened. The source is
    /// opened next, then the transaction. Any failure after that, including
    /// cancellation and timeout, rolls the transaction back and returns the
    /// original error; a failing rollback is only logged.
    ///
    /// The timeout covers the commit as well. A commit interrupted by
    /// cancellation or timeout leaves its outcome to the server.
    pub async fn run(&self, ctx: &TaskContext) -> Result<BatchOutput, TaskError> {
        let chunk_size = self.validate()?;
        let source = ctx.storage.open(&self.from)?;
        let mut tx = ctx.graph.begin().await?;

        tracing::debug!("Starting batch query: {}", self.query);

        let timer = deadline(self.timeout);
        tokio::pin!(timer);

        let outcome = {
            let chunks = chunks(read_records(source, self.from.as_str()), chunk_size);
            let work = execute_chunks(tx.as_mut(), &self.query, &self.from, chunks);
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(TaskError::Cancelled),
                elapsed = &mut timer => Err(TaskError::TimedOut(elapsed)),
                res = work => res,
            }
        };

        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!("Batch from {} failed, rolling back: {}", self.from, err);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                return Err(err);
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::warn!("Batch from {} cancelled during commit", self.from);
                return Err(TaskError::Cancelled);
            }
            elapsed = &mut timer => {
                tracing::warn!("Batch from {} timed out during commit", self.from);
                return Err(TaskError::TimedOut(elapsed));
            }
            res = tx.commit() => res?,
        }

        ctx.metrics.counter(
            Counter::new("records.processed", output.row_count).tag("origin", "Batch"),
        );
        ctx.metrics.counter(
            Counter::new("records.updated", output.updated_count).tag("origin", "Batch"),
        );
        tracing::info!(
            "Successfully bulk {} queries with {} updated rows",
            output.row_count,
            output.updated_count
        );

        Ok(output)
    }
}

/// Resolves once `timeout` has elapsed; never resolves without one.
async fn deadline(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(d) => {
            tokio::time::sleep(d).await;
            d
        }
        None => std::future::pending().await,
    }
}

/// Run every chunk in order, one at a time.
async fn execute_chunks<I>(
    tx: &mut dyn GraphTransaction,
    statement: &str,
    uri: &str,
    mut chunks: I,
) -> Result<BatchOutput, TaskError>
where
    I: Iterator<Item = Result<Vec<Record>, TaskError>> + Send + 'static,
{
    let mut output = BatchOutput::default();
    loop {
        let (rest, next) = next_chunk(chunks, uri).await?;
        chunks = rest;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        let updated = tx.run_chunk(statement, &chunk).await?;
        output.row_count += 1;
        output.updated_count += updated;
        tracing::trace!(
            "Chunk {} ({} records) returned {} rows",
            output.row_count,
            chunk.len(),
            updated
        );
    }
    Ok(output)
}

/// Pull the next chunk on the blocking pool; source reads are synchronous.
async fn next_chunk<I>(
    mut chunks: I,
    uri: &str,
) -> Result<(I, Option<Result<Vec<Record>, TaskError>>), TaskError>
where
    I: Iterator<Item = Result<Vec<Record>, TaskError>> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let next = chunks.next();
        (chunks, next)
    })
    .await
    .map_err(|e| TaskError::source_unavailable(uri, e))
}

/// Buffers a record stream into consecutive chunks.
///
/// Only one chunk is materialized at a time. The first error ends the
/// stream; records buffered before it are dropped.
pub struct Chunks<I> {
    records: I,
    size: usize,
    done: bool,
}

pub fn chunks<I>(records: I, size: NonZeroUsize) -> Chunks<I::IntoIter>
where
    I: IntoIterator<Item = Result<Record, TaskError>>,
{
    Chunks {
        records: records.into_iter(),
        size: size.get(),
        done: false,
    }
}

impl<I> Iterator for Chunks<I>
where
    I: Iterator<Item = Result<Record, TaskError>>,
{
    type Item = Result<Vec<Record>, TaskError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.size.min(MAX_PREALLOC));
        while chunk.len() < self.size {
            match self.records.next() {
                Some(Ok(record)) => chunk.push(record),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}
