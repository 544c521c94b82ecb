//! Neo4j client backed by the neo4rs bolt driver

use super::auth::Credentials;
use super::columns::{in_column_order, return_columns};
use super::convert::chunk_to_bolt;
use super::traits::{GraphConnector, GraphTransaction, CHUNK_PARAMETER};
use crate::error::TaskError;
use crate::storage::Record;
use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Txn};
use std::sync::Arc;

/// URL schemes the bolt driver can open
const SUPPORTED_SCHEMES: &[&str] = &[
    "bolt://",
    "bolt+s://",
    "bolt+ssc://",
    "neo4j://",
    "neo4j+s://",
    "neo4j+ssc://",
];

/// Everything needed to open a connection
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub url: String,
    pub credentials: Credentials,
    pub database: Option<String>,
    pub fetch_size: usize,
    pub max_connections: usize,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            database: None,
            fetch_size: 500,
            max_connections: 4,
        }
    }

    /// Fail fast on settings the driver cannot use.
    pub fn validate(&self) -> Result<(), TaskError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(TaskError::invalid("database URL is empty"));
        }
        if !SUPPORTED_SCHEMES.iter().any(|s| url.starts_with(s)) {
            return Err(TaskError::invalid(format!(
                "unsupported database URL scheme: {url}"
            )));
        }
        if matches!(self.credentials, Credentials::Bearer { .. }) {
            return Err(TaskError::invalid(
                "bearer token authentication is not supported by the bolt driver",
            ));
        }
        if self.fetch_size == 0 || self.max_connections == 0 {
            return Err(TaskError::invalid(
                "fetch_size and max_connections must be positive",
            ));
        }
        Ok(())
    }
}

/// Client for Neo4j operations
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Open a connection pool to the configured database.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self, TaskError> {
        settings.validate()?;

        let (user, password) = match &settings.credentials {
            Credentials::Basic { username, password } => (username.clone(), password.clone()),
            _ => (String::new(), String::new()),
        };

        let mut builder = ConfigBuilder::default()
            .uri(settings.url.trim())
            .user(user)
            .password(password)
            .fetch_size(settings.fetch_size)
            .max_connections(settings.max_connections);
        if let Some(db) = &settings.database {
            builder = builder.db(db.clone());
        }
        let config = builder
            .build()
            .map_err(|e| TaskError::invalid(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| TaskError::ConnectivityFailure(e.to_string()))?;

        tracing::debug!(
            "Connected to {} using {} auth",
            settings.url,
            settings.credentials.scheme()
        );

        Ok(Self {
            graph: Arc::new(graph),
        })
    }
}

#[async_trait]
impl GraphConnector for Neo4jClient {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, TaskError> {
        let txn = self.graph.start_txn().await?;
        Ok(Box::new(Neo4jTransaction { txn }))
    }

    async fn run(&self, statement: &str) -> Result<Vec<Record>, TaskError> {
        let columns = return_columns(statement);
        let mut result = self.graph.execute(query(statement)).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            let record = row.to_strict::<Record>().map_err(|e| {
                TaskError::StatementExecutionFailure(format!("cannot decode result row: {e}"))
            })?;
            rows.push(in_column_order(record, &columns));
        }
        Ok(rows)
    }
}

/// Explicit transaction on a pooled connection
pub struct Neo4jTransaction {
    txn: Txn,
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn run_chunk(&mut self, statement: &str, chunk: &[Record]) -> Result<u64, TaskError> {
        let q = query(statement).param(CHUNK_PARAMETER, chunk_to_bolt(chunk));
        let mut result = self.txn.execute(q).await?;
        let mut rows = 0u64;
        while result.next(self.txn.handle()).await?.is_some() {
            rows += 1;
        }
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), TaskError> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TaskError> {
        self.txn.rollback().await?;
        Ok(())
    }
}
