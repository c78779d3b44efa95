//! Workspace umbrella crate for the producer recommender.
//!
//! Re-exports the public surface of the member crates and adds what a
//! deployment needs around the engine: YAML configuration, the monthly
//! retrain schedule and telemetry wiring.
//!
//! ```
//! use harmonix::{build_recommender, ProducerRecord, RecommendQuery, RecommenderConfig};
//!
//! let mut config = RecommenderConfig::default();
//! config.store.backend = "in_memory".into();
//! let engine = build_recommender(&config).unwrap();
//! let catalog: Vec<_> = (0..5)
//!     .map(|i| ProducerRecord::new(format!("p-{i}"), format!("Producer {i}"))
//!         .with_genres(["House"]))
//!     .collect();
//! engine.train(&catalog).unwrap();
//! let hits = engine.recommend(&RecommendQuery::new().with_genres(["House"])).unwrap();
//! assert_eq!(hits.len(), 3);
//! ```

pub mod config;
pub mod schedule;
pub mod status;
pub mod telemetry;

pub use catalog::{
    normalize_record, normalize_tags, CatalogError, CatalogSource, FeaturedTrack,
    InMemoryCatalog, JsonFileCatalog, ProducerRecord,
};
pub use encoder::{
    active_genres, cosine_similarity, encode_producer, encode_query, EncodeError, FeatureVector,
    FeatureWeights, Segment, Vocabulary, ACTIVATION_TOLERANCE,
};
pub use index::{
    BackendConfig, CompressionCodec, CompressionConfig, IndexError, MetadataDocument,
    ModelSnapshot, SnapshotBackend, SnapshotMetadata, SnapshotStore, StoreConfig,
};
pub use matcher::{
    enrich, lookup_producer, AssistError, EngineConfig, EngineError, EnrichedRecommendation,
    Explainer, KeywordTranslator, ProducerProfile, QueryTranslator, RecommendMetrics,
    RecommendQuery, Recommendation, Recommender,
};
pub use trainer::{train, train_at, TrainedModel, TrainingConfig, TrainingError, TrainingOutcome};

pub use config::{ConfigLoadError, RecommenderConfig};
pub use schedule::{MonthlyRetrain, ScheduleError};
pub use status::ServiceStatus;
#[cfg(feature = "telemetry")]
pub use telemetry::MetricsRecorder;

/// Opens the configured snapshot store and builds an engine on top of it,
/// loading the persisted model if there is one.
pub fn build_recommender(config: &RecommenderConfig) -> Result<Recommender, EngineError> {
    let store = SnapshotStore::open(config.store_config())?;
    let engine = Recommender::open(config.engine_config(), store)?;
    #[cfg(feature = "telemetry")]
    let engine = engine.with_metrics(std::sync::Arc::new(MetricsRecorder));
    Ok(engine)
}
