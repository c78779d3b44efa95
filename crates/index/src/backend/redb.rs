//! Redb (Rust embedded database) backend for snapshot storage.
//!
//! Both snapshot keys are written inside one write transaction, so the model
//! blob and its metadata document are replaced together or not at all.
//!
//! # Configuration Example
//! ```yaml
//! store:
//!   backend: "redb"
//!   path: "/data/model.redb"
//! ```

use crate::{IndexError, SnapshotBackend};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("model_snapshots");

/// Redb backend. Redb handles its own locking and MVCC; readers never block
/// on an in-flight training write.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/model.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(|e| IndexError::backend(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| IndexError::backend(e.to_string()))?;
        {
            // Opening the table inside a write transaction creates it.
            let _table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| IndexError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl SnapshotBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.batch_put(vec![(key.to_string(), value.to_vec())])
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| IndexError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(SNAPSHOT_TABLE)
            .map_err(|e| IndexError::backend(e.to_string()))?;

        Ok(table
            .get(key)
            .map_err(|e| IndexError::backend(e.to_string()))?
            .map(|value| value.value().to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| IndexError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| IndexError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| IndexError::backend(e.to_string()))
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| IndexError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .map_err(|e| IndexError::backend(e.to_string()))?;
            for (key, value) in &entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| IndexError::backend(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| IndexError::backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn put_get_delete() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("model", b"blob").unwrap();
        assert_eq!(backend.get("model").unwrap(), Some(b"blob".to_vec()));
        assert_eq!(backend.get("missing").unwrap(), None);

        backend.delete("model").unwrap();
        assert_eq!(backend.get("model").unwrap(), None);
    }

    #[test]
    fn batch_replaces_both_keys() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();
        backend.put("model", b"old").unwrap();

        backend
            .batch_put(vec![
                ("model".to_string(), b"new".to_vec()),
                ("metadata".to_string(), b"{}".to_vec()),
            ])
            .unwrap();

        assert_eq!(backend.get("model").unwrap(), Some(b"new".to_vec()));
        assert_eq!(backend.get("metadata").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn data_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let backend = RedbBackend::open(temp_file.path()).unwrap();
            backend.put("model", b"durable").unwrap();
        }
        let reopened = RedbBackend::open(temp_file.path()).unwrap();
        assert_eq!(reopened.get("model").unwrap(), Some(b"durable".to_vec()));
    }
}
