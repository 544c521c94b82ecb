//! Test helper factories and mock context builders
#![allow(dead_code)]

use crate::metrics::InMemoryMetrics;
use crate::neo4j::mock::MockGraph;
use crate::storage::{write_records, LocalStorage, Record};
use crate::TaskContext;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Typical UNWIND import statement
pub const STATEMENT: &str = "UNWIND $props AS properties\nCREATE (n:Person)\nSET n = properties\nRETURN n";

/// Unwrap a JSON object literal into a record
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// `n` distinct person records, numbered from 0
pub fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| record(json!({"id": i, "name": format!("person-{i}"), "position": i % 7})))
        .collect()
}

/// Stage `n` records in a fresh storage root, returning the root guard,
/// the storage and the source URI.
pub fn staged_source(n: usize) -> (tempfile::TempDir, LocalStorage, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = LocalStorage::new(dir.path());
    let mut file = std::fs::File::create(dir.path().join("source.jsonl")).expect("create source");
    let uri = "storage:///source.jsonl".to_string();
    write_records(&mut file, &uri, &records(n)).expect("write source");
    (dir, storage, uri)
}

/// Build a TaskContext over the mock graph, returning the metrics sink too
pub fn mock_context(
    graph: Arc<MockGraph>,
    storage: LocalStorage,
) -> (TaskContext, Arc<InMemoryMetrics>) {
    let metrics = Arc::new(InMemoryMetrics::new());
    let ctx = TaskContext {
        graph,
        storage: Arc::new(storage),
        metrics: metrics.clone(),
        cancel: CancellationToken::new(),
    };
    (ctx, metrics)
}
