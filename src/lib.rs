//! Neo4j Tasks
//!
//! Workflow tasks executing Cypher against a Neo4j graph database:
//! - Query task with NONE / FETCH / FETCHONE / STORE result handling
//! - Batch task streaming staged records into chunked UNWIND statements,
//!   all chunks inside one transaction

pub mod error;
pub mod metrics;
pub mod neo4j;
pub mod storage;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::TaskError;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub neo4j: Neo4jYamlConfig,
    pub storage: StorageYamlConfig,
    pub batch: BatchYamlConfig,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub database: Option<String>,
    pub fetch_size: usize,
    pub max_connections: usize,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            url: "bolt://localhost:7687".into(),
            username: None,
            password: None,
            bearer_token: None,
            database: None,
            fetch_size: 500,
            max_connections: 4,
        }
    }
}

/// Staged storage section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageYamlConfig {
    pub root: String,
}

impl Default for StorageYamlConfig {
    fn default() -> Self {
        Self {
            root: "./storage".into(),
        }
    }
}

/// Batch task defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchYamlConfig {
    pub chunk: i64,
    pub timeout_secs: Option<u64>,
}

impl Default for BatchYamlConfig {
    fn default() -> Self {
        Self {
            chunk: tasks::DEFAULT_CHUNK,
            timeout_secs: None,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_url: String,
    pub neo4j_username: Option<String>,
    pub neo4j_password: Option<String>,
    pub neo4j_bearer_token: Option<String>,
    pub neo4j_database: Option<String>,
    pub fetch_size: usize,
    pub max_connections: usize,
    pub storage_root: PathBuf,
    pub batch_chunk: i64,
    pub batch_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let batch_chunk = match env_var("BATCH_CHUNK") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("BATCH_CHUNK must be an integer, got {raw:?}"))?,
            None => yaml.batch.chunk,
        };

        Ok(Self {
            neo4j_url: env_var("NEO4J_URL").unwrap_or(yaml.neo4j.url),
            neo4j_username: env_var("NEO4J_USERNAME").or(yaml.neo4j.username),
            neo4j_password: env_var("NEO4J_PASSWORD").or(yaml.neo4j.password),
            neo4j_bearer_token: env_var("NEO4J_BEARER_TOKEN").or(yaml.neo4j.bearer_token),
            neo4j_database: env_var("NEO4J_DATABASE").or(yaml.neo4j.database),
            fetch_size: yaml.neo4j.fetch_size,
            max_connections: yaml.neo4j.max_connections,
            storage_root: env_var("STORAGE_ROOT")
                .unwrap_or(yaml.storage.root)
                .into(),
            batch_chunk,
            batch_timeout: yaml.batch.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn credentials(&self) -> neo4j::Credentials {
        neo4j::Credentials::resolve(
            self.neo4j_username.as_deref(),
            self.neo4j_password.as_deref(),
            self.neo4j_bearer_token.as_deref(),
        )
    }

    pub fn connection_settings(&self) -> neo4j::ConnectionSettings {
        neo4j::ConnectionSettings {
            url: self.neo4j_url.clone(),
            credentials: self.credentials(),
            database: self.neo4j_database.clone(),
            fetch_size: self.fetch_size,
            max_connections: self.max_connections,
        }
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Collaborators a task runs against. Owned by one invocation.
#[derive(Clone)]
pub struct TaskContext {
    pub graph: Arc<dyn neo4j::GraphConnector>,
    pub storage: Arc<dyn storage::StagedStorage>,
    pub metrics: Arc<dyn metrics::MetricSink>,
    pub cancel: CancellationToken,
}

impl TaskContext {
    /// Connect to the configured database and storage root
    pub async fn new(config: &Config) -> Result<Self> {
        let graph = neo4j::Neo4jClient::connect(&config.connection_settings())
            .await
            .context("Failed to connect to Neo4j")?;

        Ok(Self {
            graph: Arc::new(graph),
            storage: Arc::new(storage::LocalStorage::new(&config.storage_root)),
            metrics: Arc::new(metrics::TracingMetrics),
            cancel: CancellationToken::new(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
