use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::normalize::normalize_records;
use crate::{CatalogError, ProducerRecord};

/// Read access to the producer catalog.
///
/// The recommender treats the catalog as read-only: it reads the full list
/// at training time and looks producers up by id when enriching results.
pub trait CatalogSource: Send + Sync {
    /// Every producer, normalized, in catalog order.
    fn producers(&self) -> Result<Vec<ProducerRecord>, CatalogError>;

    /// Looks a producer up by identifier.
    fn producer_by_id(&self, id: &str) -> Result<Option<ProducerRecord>, CatalogError> {
        Ok(self.producers()?.into_iter().find(|p| p.id == id))
    }

    /// Case-insensitive lookup by display name.
    fn producer_by_name(&self, name: &str) -> Result<Option<ProducerRecord>, CatalogError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .producers()?
            .into_iter()
            .find(|p| p.full_name.to_lowercase() == needle))
    }

    /// Tries `key` as an identifier first, then as a display name.
    fn producer_by_id_or_name(&self, key: &str) -> Result<Option<ProducerRecord>, CatalogError> {
        match self.producer_by_id(key)? {
            Some(producer) => Ok(Some(producer)),
            None => self.producer_by_name(key),
        }
    }
}

/// An in-memory catalog guarded by a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: RwLock<Vec<ProducerRecord>>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<ProducerRecord>) -> Result<Self, CatalogError> {
        Ok(Self {
            records: RwLock::new(normalize_records(records)?),
        })
    }

    /// Replaces the whole catalog, as a refreshed export would.
    pub fn replace(&self, records: Vec<ProducerRecord>) -> Result<(), CatalogError> {
        let normalized = normalize_records(records)?;
        *self
            .records
            .write()
            .map_err(|_| CatalogError::Io("poisoned lock".into()))? = normalized;
        Ok(())
    }

    /// Removes a producer, returning whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool, CatalogError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| CatalogError::Io("poisoned lock".into()))?;
        let before = guard.len();
        guard.retain(|p| p.id != id);
        Ok(guard.len() != before)
    }
}

impl CatalogSource for InMemoryCatalog {
    fn producers(&self) -> Result<Vec<ProducerRecord>, CatalogError> {
        let guard = self
            .records
            .read()
            .map_err(|_| CatalogError::Io("poisoned lock".into()))?;
        Ok(guard.clone())
    }

    fn producer_by_id(&self, id: &str) -> Result<Option<ProducerRecord>, CatalogError> {
        let guard = self
            .records
            .read()
            .map_err(|_| CatalogError::Io("poisoned lock".into()))?;
        Ok(guard.iter().find(|p| p.id == id).cloned())
    }
}

/// A catalog stored as a JSON array of producer documents.
///
/// The file is re-read on every call so a retrain always sees the latest
/// export.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    fn producers(&self) -> Result<Vec<ProducerRecord>, CatalogError> {
        let bytes = fs::read(&self.path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", self.path.display())))?;
        let records: Vec<ProducerRecord> = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), count = records.len(), "catalog_loaded");
        normalize_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> Vec<ProducerRecord> {
        vec![
            ProducerRecord::new("p-1", "Ada Beats").with_genres(["Trap"]),
            ProducerRecord::new("p-2", "Bo Keys").with_genres(["Jazz"]),
        ]
    }

    #[test]
    fn in_memory_lookup_by_id_and_name() {
        let catalog = InMemoryCatalog::new(sample()).unwrap();
        assert_eq!(
            catalog.producer_by_id("p-2").unwrap().unwrap().full_name,
            "Bo Keys"
        );
        assert_eq!(
            catalog.producer_by_name("ada beats").unwrap().unwrap().id,
            "p-1"
        );
        assert!(catalog.producer_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn id_lookup_wins_over_name_lookup() {
        let catalog = InMemoryCatalog::new(vec![
            ProducerRecord::new("p-1", "Ada Beats"),
            ProducerRecord::new("p-2", "p-1"),
        ])
        .unwrap();
        assert_eq!(catalog.producer_by_id_or_name("p-1").unwrap().unwrap().full_name, "Ada Beats");
        assert_eq!(catalog.producer_by_id_or_name("ADA BEATS").unwrap().unwrap().id, "p-1");
        assert!(catalog.producer_by_id_or_name("nobody").unwrap().is_none());
    }

    #[test]
    fn in_memory_replace_and_remove() {
        let catalog = InMemoryCatalog::new(sample()).unwrap();
        assert!(catalog.remove("p-1").unwrap());
        assert!(!catalog.remove("p-1").unwrap());
        assert_eq!(catalog.producers().unwrap().len(), 1);

        catalog
            .replace(vec![ProducerRecord::new("p-9", "Nine")])
            .unwrap();
        assert_eq!(catalog.producers().unwrap()[0].id, "p-9");
    }

    #[test]
    fn json_file_catalog_reads_and_normalizes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"_id": " p-1 ", "fullName": "Ada", "genres": ["Trap", " Trap "]}}]"#
        )
        .unwrap();
        let catalog = JsonFileCatalog::new(file.path());
        let producers = catalog.producers().unwrap();
        assert_eq!(producers.len(), 1);
        assert_eq!(producers[0].id, "p-1");
        assert_eq!(producers[0].genres, vec!["Trap"]);
    }

    #[test]
    fn json_file_catalog_tolerates_nulls() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"_id": "p-1", "fullName": null, "genres": [null, "Trap"]}}, {{"_id": "p-2", "fullName": "Bo", "skills": [null]}}]"#
        )
        .unwrap();
        let producers = JsonFileCatalog::new(file.path()).producers().unwrap();
        assert_eq!(producers.len(), 2);
        assert_eq!(producers[0].full_name, "");
        assert_eq!(producers[0].genres, vec!["Trap"]);
        assert!(producers[1].skills.is_empty());
    }

    #[test]
    fn json_file_catalog_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonFileCatalog::new(file.path()).producers().unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn json_file_catalog_reports_missing_file() {
        let err = JsonFileCatalog::new("/nonexistent/catalog.json")
            .producers()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
