//! Single Cypher statement with a selectable result mode

use crate::error::TaskError;
use crate::metrics::Counter;
use crate::storage::{write_records, Record};
use crate::TaskContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extension of files written in `STORE` mode
pub const STORE_EXTENSION: &str = "jsonl";

/// What to do with the rows a statement returns.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreType {
    /// Write every row to staged storage
    Store,
    /// Return every row
    Fetch,
    /// Return the first row only
    #[value(name = "fetchone")]
    FetchOne,
    /// Discard the result
    #[default]
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryTask {
    pub query: String,
    #[serde(default, rename = "storeType")]
    pub store_type: StoreType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    /// Populated in `FETCH` mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Record>>,
    /// Populated in `FETCHONE` mode; empty when nothing matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<Record>,
    /// Populated in `STORE` mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl QueryTask {
    pub fn new(query: impl Into<String>, store_type: StoreType) -> Self {
        Self {
            query: query.into(),
            store_type,
        }
    }

    pub async fn run(&self, ctx: &TaskContext) -> Result<QueryOutput, TaskError> {
        if self.query.trim().is_empty() {
            return Err(TaskError::invalid("query is empty"));
        }

        tracing::debug!("Starting query: {}", self.query);

        let rows = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(TaskError::Cancelled),
            rows = ctx.graph.run(&self.query) => rows?,
        };

        let output = match self.store_type {
            StoreType::None => QueryOutput::default(),
            StoreType::Fetch => {
                let records = flatten_rows(rows);
                let size = records.len() as u64;
                ctx.metrics.counter(Counter::new("fetch.size", size));
                QueryOutput {
                    rows: Some(records),
                    size: Some(size),
                    ..Default::default()
                }
            }
            StoreType::FetchOne => {
                let records = flatten_rows(rows);
                let size = records.len() as u64;
                ctx.metrics.counter(Counter::new("fetch.size", size));
                QueryOutput {
                    row: Some(records.into_iter().next().unwrap_or_default()),
                    size: Some(size),
                    ..Default::default()
                }
            }
            StoreType::Store => {
                let records = flatten_rows(rows);
                let (uri, mut writer) = ctx.storage.create(STORE_EXTENSION)?;
                let size = write_records(&mut *writer, &uri, &records)?;
                ctx.metrics.counter(Counter::new("store.size", size));
                tracing::info!("Stored {} rows to {}", size, uri);
                QueryOutput {
                    uri: Some(uri),
                    size: Some(size),
                    ..Default::default()
                }
            }
        };

        Ok(output)
    }
}

/// Turn column-keyed rows into records.
///
/// Every column value of every row becomes one record: maps and nodes are
/// taken as they are, any other value is wrapped as `{column: value}`.
pub fn flatten_rows(rows: Vec<Record>) -> Vec<Record> {
    rows.into_iter()
        .flat_map(|row| row.into_iter())
        .map(|(column, value)| match value {
            Value::Object(map) => map,
            other => {
                let mut record = Record::new();
                record.insert(column, other);
                record
            }
        })
        .collect()
}
