//! Local filesystem implementation of StagedStorage

use super::traits::StagedStorage;
use crate::error::TaskError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Scheme for files living under the storage root
pub const STORAGE_SCHEME: &str = "storage://";
/// Scheme for absolute paths outside the root
pub const FILE_SCHEME: &str = "file://";
/// Read/write buffer size for staged files
pub const BUFFER_SIZE: usize = 32 * 1024;

/// Staged storage backed by a directory on the local filesystem.
///
/// Accepts `storage:///<relative path>` (resolved under the root) and
/// `file://<absolute path>` URIs. Newly created files are named with a
/// random UUID and always live under the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URI onto a filesystem path.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf, TaskError> {
        if let Some(rest) = uri.strip_prefix(STORAGE_SCHEME) {
            let relative = Path::new(rest.trim_start_matches('/'));
            let escapes = relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes || rest.trim_start_matches('/').is_empty() {
                return Err(TaskError::invalid(format!(
                    "storage URI must name a file under the storage root: {uri}"
                )));
            }
            return Ok(self.root.join(relative));
        }

        if let Some(rest) = uri.strip_prefix(FILE_SCHEME) {
            let path = PathBuf::from(rest);
            if !path.is_absolute() {
                return Err(TaskError::invalid(format!(
                    "file URI must carry an absolute path: {uri}"
                )));
            }
            return Ok(path);
        }

        Err(TaskError::invalid(format!("unsupported URI scheme: {uri}")))
    }
}

impl StagedStorage for LocalStorage {
    fn open(&self, uri: &str) -> Result<Box<dyn BufRead + Send>, TaskError> {
        let path = self.resolve(uri)?;
        let file = File::open(&path).map_err(|e| TaskError::source_unavailable(uri, e))?;
        tracing::debug!("Opened staged file {}", path.display());
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }

    fn create(&self, extension: &str) -> Result<(String, Box<dyn Write + Send>), TaskError> {
        let name = format!("{}.{}", Uuid::new_v4(), extension.trim_start_matches('.'));
        let uri = format!("{STORAGE_SCHEME}/{name}");

        std::fs::create_dir_all(&self.root)
            .map_err(|e| TaskError::source_unavailable(&uri, e))?;
        let file = File::create(self.root.join(&name))
            .map_err(|e| TaskError::source_unavailable(&uri, e))?;

        Ok((uri, Box::new(BufWriter::with_capacity(BUFFER_SIZE, file))))
    }
}
