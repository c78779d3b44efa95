use encoder::{EncodeError, FeatureWeights};
use index::IndexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Knobs of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Smallest catalog a model is built from.
    pub min_catalog_size: usize,
    /// Requested neighborhood size. The fitted index uses
    /// `min(n_neighbors, catalog size)`.
    pub n_neighbors: usize,
    /// Presence weights written into every producer row.
    pub weights: FeatureWeights,
    /// Encode and evaluate rows on the rayon pool.
    pub use_parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_catalog_size: 5,
            n_neighbors: 11,
            weights: FeatureWeights::default(),
            use_parallel: false,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_catalog_size(mut self, size: usize) -> Self {
        self.min_catalog_size = size;
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_weights(mut self, weights: FeatureWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.min_catalog_size < 1 {
            return Err(TrainingError::InvalidConfig(
                "min_catalog_size must be >= 1".into(),
            ));
        }
        // One neighbor would always be the producer itself.
        if self.n_neighbors < 2 {
            return Err(TrainingError::InvalidConfig(format!(
                "n_neighbors must be >= 2 (got {})",
                self.n_neighbors
            )));
        }
        self.weights
            .validate()
            .map_err(|e| TrainingError::InvalidConfig(e.to_string()))
    }
}

/// Errors returned by a training run. The previous snapshot is untouched in
/// every case.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingError {
    #[error("not enough producers to train a model: {count} available, minimum {required}")]
    InsufficientData { count: usize, required: usize },

    #[error("training failed: {0}")]
    TrainingFailed(String),

    #[error("invalid training config: {0}")]
    InvalidConfig(String),
}

impl From<IndexError> for TrainingError {
    fn from(err: IndexError) -> Self {
        TrainingError::TrainingFailed(err.to_string())
    }
}

impl From<EncodeError> for TrainingError {
    fn from(err: EncodeError) -> Self {
        TrainingError::TrainingFailed(err.to_string())
    }
}
