use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::{DateTime, Utc};
use encoder::{FeatureWeights, Vocabulary};
use serde::{Deserialize, Serialize};

use crate::{CompressionConfig, FeatureMatrix, IndexError, Neighbor, NeighborIndex};

/// Bump this value whenever the stored `ModelSnapshot` layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

/// `chrono` format of the model version string derived from the training
/// timestamp.
pub const MODEL_VERSION_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Facts about one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Training timestamp rendered with [`MODEL_VERSION_FORMAT`].
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub dataset_size: usize,
    /// Mean neighbor similarity across the catalog, self-matches excluded.
    pub avg_similarity: f64,
    pub n_neighbors: usize,
    pub feature_width: usize,
}

impl SnapshotMetadata {
    pub fn new(
        trained_at: DateTime<Utc>,
        dataset_size: usize,
        avg_similarity: f64,
        n_neighbors: usize,
        feature_width: usize,
    ) -> Self {
        Self {
            model_version: trained_at.format(MODEL_VERSION_FORMAT).to_string(),
            trained_at,
            dataset_size,
            avg_similarity,
            n_neighbors,
            feature_width,
        }
    }
}

/// Inputs to [`ModelSnapshot::new`].
#[derive(Debug, Clone)]
pub struct SnapshotParts {
    pub vocabulary: Vocabulary,
    pub weights: FeatureWeights,
    pub matrix: FeatureMatrix,
    pub producer_ids: Vec<String>,
    pub producer_names: Vec<String>,
    pub index: NeighborIndex,
    pub metadata: SnapshotMetadata,
}

/// The complete output of one training run.
///
/// Rows of the matrix, producer ids, and producer names are kept in
/// lockstep. Construction and decoding both validate every shape invariant,
/// so a `ModelSnapshot` in hand is always internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    schema_version: u16,
    vocabulary: Vocabulary,
    weights: FeatureWeights,
    matrix: FeatureMatrix,
    producer_ids: Vec<String>,
    producer_names: Vec<String>,
    index: NeighborIndex,
    metadata: SnapshotMetadata,
}

/// A borrowed view of one producer's row in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProducerRow<'a> {
    pub position: usize,
    pub id: &'a str,
    pub name: &'a str,
    pub features: &'a [f32],
}

impl ModelSnapshot {
    pub fn new(parts: SnapshotParts) -> Result<Self, IndexError> {
        let snapshot = Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            vocabulary: parts.vocabulary,
            weights: parts.weights,
            matrix: parts.matrix,
            producer_ids: parts.producer_ids,
            producer_names: parts.producer_names,
            index: parts.index,
            metadata: parts.metadata,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IndexError::IncompatibleSchema {
                found: self.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        let invalid = |msg: String| Err(IndexError::InvalidSnapshot(msg));
        if !self.vocabulary.is_well_formed() {
            return invalid("vocabulary lists are not sorted and unique".into());
        }
        if let Err(err) = self.weights.validate() {
            return invalid(err.to_string());
        }
        if !self.matrix.is_consistent() {
            return invalid("matrix storage does not match its shape".into());
        }
        if self.matrix.width() != self.vocabulary.width() {
            return invalid(format!(
                "matrix width {} != vocabulary width {}",
                self.matrix.width(),
                self.vocabulary.width()
            ));
        }
        let rows = self.matrix.rows();
        if self.producer_ids.len() != rows || self.producer_names.len() != rows {
            return invalid(format!(
                "{} rows but {} ids and {} names",
                rows,
                self.producer_ids.len(),
                self.producer_names.len()
            ));
        }
        if !self.index.matches(&self.matrix) {
            return invalid("neighbor index was fitted on a different matrix".into());
        }
        let meta = &self.metadata;
        if meta.dataset_size != rows
            || meta.feature_width != self.matrix.width()
            || meta.n_neighbors != self.index.n_neighbors()
        {
            return invalid("metadata disagrees with snapshot contents".into());
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn producer_ids(&self) -> &[String] {
        &self.producer_ids
    }

    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn producer(&self, position: usize) -> Option<ProducerRow<'_>> {
        Some(ProducerRow {
            position,
            id: self.producer_ids.get(position)?,
            name: self.producer_names.get(position)?,
            features: self.matrix.row(position)?,
        })
    }

    /// Producers in catalog order.
    pub fn producers(&self) -> impl Iterator<Item = ProducerRow<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.producer(i))
    }

    pub fn position_of(&self, producer_id: &str) -> Option<usize> {
        self.producer_ids.iter().position(|id| id == producer_id)
    }

    /// Nearest producers to an encoded query.
    pub fn nearest(&self, query: &[f32], k: Option<usize>) -> Result<Vec<Neighbor>, IndexError> {
        self.index.kneighbors(&self.matrix, query, k)
    }

    /// Serializes with bincode and compresses.
    pub fn encode(&self, compression: &CompressionConfig) -> Result<Vec<u8>, IndexError> {
        let raw = encode_to_vec(self, standard())?;
        compression.compress(&raw)
    }

    /// Inverse of [`encode`](Self::encode). The decoded snapshot is
    /// re-validated before it is returned.
    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        let raw = CompressionConfig::decompress(bytes)?;
        let (snapshot, _): (ModelSnapshot, usize) = decode_from_slice(&raw, standard())?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn metadata_document(&self) -> MetadataDocument {
        MetadataDocument {
            schema_version: self.schema_version,
            metadata: self.metadata.clone(),
            weights: self.weights,
            all_genres: self.vocabulary.genres().to_vec(),
            all_skills: self.vocabulary.skills().to_vec(),
            all_tools: self.vocabulary.tools().to_vec(),
            all_experience_levels: self.vocabulary.experience_levels().to_vec(),
        }
    }
}

/// Human-readable companion of the model blob.
///
/// Carries the training facts and the vocabulary lists, which is all a query
/// translator needs without decoding the full model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub schema_version: u16,
    #[serde(flatten)]
    pub metadata: SnapshotMetadata,
    pub weights: FeatureWeights,
    pub all_genres: Vec<String>,
    pub all_skills: Vec<String>,
    pub all_tools: Vec<String>,
    pub all_experience_levels: Vec<String>,
}

impl MetadataDocument {
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::from_parts(
            self.all_genres.iter().cloned(),
            self.all_skills.iter().cloned(),
            self.all_tools.iter().cloned(),
            self.all_experience_levels.iter().cloned(),
        )
    }
}
