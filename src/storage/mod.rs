//! Staged storage access and the line-delimited record codec

pub mod local;
pub mod records;
pub mod traits;

pub use local::LocalStorage;
pub use records::{read_records, write_records, Record};
pub use traits::StagedStorage;
