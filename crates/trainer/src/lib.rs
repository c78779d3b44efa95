//! # Producer Trainer
//!
//! Builds a [`ModelSnapshot`] from the full producer catalog in one batch:
//!
//! ```text
//! catalog ─► normalize ─► vocabulary ─► encode rows ─► fit k-NN ─► self-evaluate ─► snapshot
//! ```
//!
//! Training is a pure function of the catalog and [`TrainingConfig`] plus
//! the timestamp. Persisting the snapshot and swapping it in for live
//! queries is the caller's job (see the `matcher` crate), so a failed run
//! never disturbs the model already serving requests.
//!
//! ```
//! use catalog::ProducerRecord;
//! use trainer::{train, TrainingConfig};
//!
//! let catalog: Vec<_> = (0..6)
//!     .map(|i| ProducerRecord::new(format!("p-{i}"), format!("Producer {i}"))
//!         .with_genres([if i % 2 == 0 { "Trap" } else { "Jazz" }]))
//!     .collect();
//! let trained = train(&catalog, &TrainingConfig::default()).unwrap();
//! assert_eq!(trained.outcome.dataset_size, 6);
//! assert_eq!(trained.outcome.n_neighbors, 6);
//! ```

mod config;
mod evaluate;

pub use config::{TrainingConfig, TrainingError};
pub use evaluate::{mean_neighbor_similarity, SELF_MATCH_EPSILON};

use std::collections::HashSet;
use std::time::Instant;

use catalog::{normalize_records, ProducerRecord};
use chrono::{DateTime, Utc};
use encoder::{encode_producer, FeatureVector, Vocabulary};
use index::{FeatureMatrix, ModelSnapshot, NeighborIndex, SnapshotMetadata, SnapshotParts};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

/// Summary of a successful training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Mean neighbor similarity, self-matches excluded.
    pub avg_similarity: f64,
    pub training_time_secs: f64,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub dataset_size: usize,
    pub n_neighbors: usize,
}

impl TrainingOutcome {
    /// The evaluation score rounded to four places, for display.
    pub fn rounded_similarity(&self) -> f64 {
        (self.avg_similarity * 10_000.0).round() / 10_000.0
    }
}

/// A new snapshot together with the report describing it.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub snapshot: ModelSnapshot,
    pub outcome: TrainingOutcome,
}

/// Trains a snapshot stamped with the current time.
pub fn train(
    catalog: &[ProducerRecord],
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainingError> {
    train_at(catalog, config, Utc::now())
}

/// Trains a snapshot stamped with `trained_at`.
pub fn train_at(
    catalog: &[ProducerRecord],
    config: &TrainingConfig,
    trained_at: DateTime<Utc>,
) -> Result<TrainedModel, TrainingError> {
    let span = tracing::span!(Level::INFO, "trainer.train", dataset_size = catalog.len());
    let _guard = span.enter();
    let start = Instant::now();

    let result = build(catalog, config, trained_at, start);
    match &result {
        Ok(trained) => info!(
            model_version = %trained.outcome.model_version,
            dataset_size = trained.outcome.dataset_size,
            n_neighbors = trained.outcome.n_neighbors,
            avg_similarity = trained.outcome.avg_similarity,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "training_success"
        ),
        Err(err) => warn!(error = %err, "training_failure"),
    }
    result
}

fn build(
    catalog: &[ProducerRecord],
    config: &TrainingConfig,
    trained_at: DateTime<Utc>,
    start: Instant,
) -> Result<TrainedModel, TrainingError> {
    config.validate()?;
    if catalog.len() < config.min_catalog_size {
        return Err(TrainingError::InsufficientData {
            count: catalog.len(),
            required: config.min_catalog_size,
        });
    }

    let records = normalize_records(catalog.iter().cloned())
        .map_err(|e| TrainingError::TrainingFailed(e.to_string()))?;
    ensure_unique_ids(&records)?;

    let vocabulary = Vocabulary::from_records(&records);
    let weights = config.weights;
    let encode = |record: &ProducerRecord| encode_producer(record, &vocabulary, &weights);
    let rows: Vec<FeatureVector> = if config.use_parallel {
        records.par_iter().map(encode).collect()
    } else {
        records.iter().map(encode).collect()
    };
    let matrix = FeatureMatrix::from_rows(vocabulary.width(), &rows)?;

    let n_neighbors = config.n_neighbors.min(records.len());
    let index = NeighborIndex::fit(&matrix, n_neighbors)?;

    let avg_similarity = mean_neighbor_similarity(&index, &matrix, config.use_parallel)?;
    if !avg_similarity.is_finite() {
        return Err(TrainingError::TrainingFailed(
            "evaluation score is not finite".into(),
        ));
    }

    let metadata = SnapshotMetadata::new(
        trained_at,
        records.len(),
        avg_similarity,
        n_neighbors,
        vocabulary.width(),
    );
    let outcome = TrainingOutcome {
        avg_similarity,
        training_time_secs: start.elapsed().as_secs_f64(),
        model_version: metadata.model_version.clone(),
        trained_at,
        dataset_size: records.len(),
        n_neighbors,
    };
    let snapshot = ModelSnapshot::new(SnapshotParts {
        vocabulary,
        weights,
        matrix,
        producer_ids: records.iter().map(|r| r.id.clone()).collect(),
        producer_names: records.iter().map(|r| r.full_name.clone()).collect(),
        index,
        metadata,
    })?;

    Ok(TrainedModel { snapshot, outcome })
}

fn ensure_unique_ids(records: &[ProducerRecord]) -> Result<(), TrainingError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(TrainingError::TrainingFailed(format!(
                "duplicate producer id {:?}",
                record.id
            )));
        }
    }
    Ok(())
}
