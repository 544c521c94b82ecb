//! Runnable tasks: single query and chunked batch import

pub mod batch;
pub mod query;

pub use batch::{BatchOutput, BatchTask, DEFAULT_CHUNK};
pub use query::{QueryOutput, QueryTask, StoreType};
