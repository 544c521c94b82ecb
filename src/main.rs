//! Neo4j Tasks - command-line runner
//!
//! Runs one task against the configured database and prints its output as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use neo4j_tasks::tasks::{BatchTask, QueryTask, StoreType};
use neo4j_tasks::{Config, TaskContext};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "neo4j-task")]
#[command(about = "Run Cypher queries and batch imports against Neo4j")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "NEO4J_TASKS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single Cypher statement
    Query {
        /// Statement to run
        #[arg(short, long)]
        query: String,

        /// How to handle the returned rows
        #[arg(long, value_enum, default_value_t = StoreType::None)]
        store_type: StoreType,
    },

    /// Stream staged records into a chunked UNWIND statement
    Batch {
        /// Staged-storage URI of the line-delimited JSON source
        #[arg(short, long)]
        from: String,

        /// Statement receiving each chunk as $props
        #[arg(short, long)]
        query: String,

        /// Records per chunk (overrides config.yaml)
        #[arg(long, allow_hyphen_values = true)]
        chunk: Option<i64>,

        /// Abort and roll back after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,neo4j_tasks=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let ctx = TaskContext::new(&config).await?;

    // Ctrl-C cancels the running task; the batch rolls back before exiting.
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling task");
            cancel.cancel();
        }
    });

    let output = match cli.command {
        Commands::Query { query, store_type } => {
            let out = QueryTask::new(query, store_type)
                .run(&ctx)
                .await
                .context("Query task failed")?;
            serde_json::to_string_pretty(&out)?
        }
        Commands::Batch {
            from,
            query,
            chunk,
            timeout_secs,
        } => {
            let mut task = BatchTask::new(from, query).with_chunk(chunk.unwrap_or(config.batch_chunk));
            task.timeout = timeout_secs.map(Duration::from_secs).or(config.batch_timeout);
            let out = task.run(&ctx).await.context("Batch task failed")?;
            serde_json::to_string_pretty(&out)?
        }
    };

    println!("{output}");
    Ok(())
}
