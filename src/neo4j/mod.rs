//! Neo4j connectivity: credentials, the bolt client and its trait seam

pub mod auth;
pub mod client;
pub mod columns;
pub mod convert;
pub mod traits;

pub use auth::Credentials;
pub use client::{ConnectionSettings, Neo4jClient};
pub use traits::{GraphConnector, GraphTransaction, CHUNK_PARAMETER};

#[cfg(test)]
pub(crate) mod mock;
