//! Directory backend: each key is a file under one model directory.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a reader (or a crash) only ever sees the previous
//! file or the complete new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{IndexError, SnapshotBackend};

pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    /// Opens the directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| IndexError::backend(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, IndexError> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(IndexError::backend(format!("invalid key {key:?}")));
        }
        Ok(self.root.join(key))
    }
}

impl SnapshotBackend for DirectoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let target = self.path_for(key)?;
        let io_err = |e: std::io::Error| IndexError::backend(format!("{}: {e}", target.display()));

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(value).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&target).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IndexError::backend(format!("{}: {e}", path.display()))),
        }
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IndexError::backend(format!("{}: {e}", path.display()))),
        }
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        // Stage every value before renaming anything: a failed write or an
        // unusable target leaves all existing files untouched.
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let target = self.path_for(key)?;
            let io_err = |e: std::io::Error| IndexError::backend(format!("{}: {e}", target.display()));
            if fs::metadata(&target).is_ok_and(|meta| meta.is_dir()) {
                return Err(io_err(std::io::Error::new(
                    ErrorKind::IsADirectory,
                    "target is a directory",
                )));
            }
            let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
            tmp.write_all(value).map_err(io_err)?;
            tmp.as_file().sync_all().map_err(io_err)?;
            staged.push((tmp, target));
        }

        // Renames happen in entry order; the last entry is the commit point.
        for (tmp, target) in staged {
            tmp.persist(&target)
                .map_err(|e| IndexError::backend(format!("{}: {}", target.display(), e.error)))?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), IndexError> {
        // Persist the renames themselves.
        #[cfg(unix)]
        {
            fs::File::open(&self.root)
                .and_then(|dir| dir.sync_all())
                .map_err(|e| IndexError::backend(format!("{}: {e}", self.root.display())))?;
        }
        Ok(())
    }
}
