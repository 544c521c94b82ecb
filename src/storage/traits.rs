//! Trait abstraction for the orchestrator's staged file storage

use crate::error::TaskError;
use std::io::{BufRead, Write};

/// A file store addressed by URI.
///
/// Readers are positioned at the start of the file and are read exactly once,
/// forward only. Handles are owned by the caller and closed on drop.
/// Reads may block; async callers drive them on the blocking pool.
pub trait StagedStorage: Send + Sync {
    /// Open an existing file for reading.
    fn open(&self, uri: &str) -> Result<Box<dyn BufRead + Send>, TaskError>;

    /// Create a fresh file with the given extension, returning its URI and a writer.
    fn create(&self, extension: &str) -> Result<(String, Box<dyn Write + Send>), TaskError>;
}
