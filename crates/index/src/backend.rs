use crate::IndexError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Key-value storage for snapshot blobs.
///
/// The store writes exactly two keys per training run: the model blob and
/// its metadata document. `batch_put` must make both visible together where
/// the backend can (redb). Otherwise it writes in order and must not replace
/// any key if the batch fails before its last entry (directory).
pub trait SnapshotBackend: Send + Sync {
    /// Insert or replace a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Delete a value. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<(), IndexError>;
    /// Insert or replace several values, in the given order.
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError>;
    /// Flush any buffered writes to durable storage.
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // One file per key under a model directory
/// let config = BackendConfig::directory("./model");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Keep blobs in a `HashMap`. Nothing survives the process.
    #[default]
    InMemory,
    /// One file per key inside `path`, replaced atomically via rename.
    Directory { path: PathBuf },
    /// A redb database file at `path`.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: PathBuf },
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        BackendConfig::Directory { path: path.into() }
    }

    pub fn redb<P: Into<PathBuf>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend for this configuration.
    pub fn build(&self) -> Result<Box<dyn SnapshotBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Directory { path } => Ok(Box::new(DirectoryBackend::open(path)?)),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory backend using a `RwLock` around a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        // One write lock for the whole batch: readers see all or nothing.
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        guard.extend(entries);
        Ok(())
    }
}

mod fs;
pub use fs::DirectoryBackend;

/// The Redb backend implementation.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;
