use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{
    BackendConfig, CompressionConfig, IndexError, MetadataDocument, ModelSnapshot, SnapshotBackend,
};

/// Key of the compressed model blob.
pub const DEFAULT_MODEL_KEY: &str = "producer_recommender_model.bin";
/// Key of the JSON metadata document.
pub const DEFAULT_METADATA_KEY: &str = "model_metadata.json";

/// Where and how the current snapshot is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    pub compression: CompressionConfig,
    pub model_key: String,
    pub metadata_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            compression: CompressionConfig::default(),
            model_key: DEFAULT_MODEL_KEY.to_string(),
            metadata_key: DEFAULT_METADATA_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_keys(mut self, model_key: impl Into<String>, metadata_key: impl Into<String>) -> Self {
        self.model_key = model_key.into();
        self.metadata_key = metadata_key.into();
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.model_key.trim().is_empty() || self.metadata_key.trim().is_empty() {
            return Err(IndexError::backend("store keys must not be empty"));
        }
        if self.model_key == self.metadata_key {
            return Err(IndexError::backend(
                "model_key and metadata_key must differ",
            ));
        }
        Ok(())
    }
}

/// The durable home of the current model: one compressed bincode blob and
/// one JSON metadata document, both replaced on every successful training
/// run. Older snapshots are not retained.
pub struct SnapshotStore {
    backend: Box<dyn SnapshotBackend>,
    compression: CompressionConfig,
    model_key: String,
    metadata_key: String,
}

impl SnapshotStore {
    /// Builds the configured backend and opens the store.
    pub fn open(config: StoreConfig) -> Result<Self, IndexError> {
        config.validate()?;
        let backend = config.backend.build()?;
        Ok(Self::with_backend(config, backend))
    }

    /// Uses an already constructed backend; `config.backend` is ignored.
    pub fn with_backend(config: StoreConfig, backend: Box<dyn SnapshotBackend>) -> Self {
        Self {
            backend,
            compression: config.compression,
            model_key: config.model_key,
            metadata_key: config.metadata_key,
        }
    }

    /// An ephemeral store for tests and one-shot runs.
    pub fn in_memory() -> Self {
        Self::with_backend(StoreConfig::default(), Box::new(crate::InMemoryBackend::new()))
    }

    /// Writes the snapshot and its metadata document.
    ///
    /// On error nothing new may be visible: callers keep serving the
    /// previous snapshot.
    pub fn save(&self, snapshot: &ModelSnapshot) -> Result<(), IndexError> {
        let start = Instant::now();
        let blob = snapshot.encode(&self.compression)?;
        let metadata = serde_json::to_vec_pretty(&snapshot.metadata_document())?;
        let blob_bytes = blob.len();

        // The model blob goes last. It is the authoritative record, so a
        // batch that stops early never replaces it.
        self.backend.batch_put(vec![
            (self.metadata_key.clone(), metadata),
            (self.model_key.clone(), blob),
        ])?;
        self.backend.flush()?;

        info!(
            model_version = %snapshot.metadata().model_version,
            dataset_size = snapshot.len(),
            blob_bytes,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "snapshot_saved"
        );
        Ok(())
    }

    /// Loads the current snapshot, or `None` when nothing has been saved.
    pub fn load(&self) -> Result<Option<ModelSnapshot>, IndexError> {
        let Some(blob) = self.backend.get(&self.model_key)? else {
            debug!(key = %self.model_key, "snapshot_absent");
            return Ok(None);
        };
        let snapshot = ModelSnapshot::decode(&blob)?;

        // The metadata document is advisory; a disagreement is logged, not fatal.
        match self.load_metadata() {
            Ok(Some(doc)) if doc.metadata.model_version != snapshot.metadata().model_version => {
                warn!(
                    model_version = %snapshot.metadata().model_version,
                    metadata_version = %doc.metadata.model_version,
                    "snapshot_metadata_mismatch"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "snapshot_metadata_unreadable"),
        }

        info!(
            model_version = %snapshot.metadata().model_version,
            dataset_size = snapshot.len(),
            "snapshot_loaded"
        );
        Ok(Some(snapshot))
    }

    pub fn load_metadata(&self) -> Result<Option<MetadataDocument>, IndexError> {
        match self.backend.get(&self.metadata_key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes the stored snapshot and metadata.
    pub fn clear(&self) -> Result<(), IndexError> {
        self.backend.delete(&self.model_key)?;
        self.backend.delete(&self.metadata_key)?;
        self.backend.flush()
    }
}
