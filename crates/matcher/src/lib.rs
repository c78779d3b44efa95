//! # Producer Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` serves recommendations from the snapshot built by `trainer`
//! and kept by `index`. It owns the live model, swaps in retrained
//! snapshots without interrupting readers, and ranks producers for a
//! request with a two-stage policy:
//!
//! 1. **Genre gate**: only producers declaring at least one requested genre
//!    are candidates.
//! 2. **Match-boosted similarity**: candidates score
//!    `cosine(query, producer) × (1 + matched_genres / requested_genres)`
//!    and the top `n` are returned in descending order.
//!
//! ## Core Types
//!
//! - [`RecommendQuery`]: requested genres, skills, tools, experience level
//!   and an optional per-request `top_n`.
//! - [`Recommendation`]: producer id, name, score and the matching genres.
//! - [`Recommender`]: the engine. Trains, persists, reloads and serves.
//! - [`QueryTranslator`] / [`Explainer`]: optional free-text front end and
//!   per-result explanations, with [`KeywordTranslator`] built in.
//!
//! ## Example Usage
//!
//! ```
//! use catalog::ProducerRecord;
//! use matcher::{EngineConfig, RecommendQuery, Recommender};
//!
//! let catalog: Vec<_> = ["Trap", "Jazz", "Trap", "House", "Jazz"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, genre)| ProducerRecord::new(format!("p-{i}"), format!("Producer {i}"))
//!         .with_genres([*genre]))
//!     .collect();
//!
//! let engine = Recommender::new(EngineConfig::default()).unwrap();
//! engine.train(&catalog).unwrap();
//!
//! let hits = engine.recommend(&RecommendQuery::new().with_genres(["Jazz"])).unwrap();
//! assert_eq!(hits.len(), 2);
//! assert_eq!(hits[0].producer_id, "p-1");
//! ```
//!
//! ## Observability
//!
//! Install a [`RecommendMetrics`] implementation with
//! [`Recommender::with_metrics`] to record request latency, hit counts and
//! training outcomes.

pub mod assist;
pub mod engine;
pub mod metrics;
pub mod resolve;
pub mod types;

pub use crate::assist::{
    constrain_to_vocabulary, enrich, lookup_producer, AssistError, EnrichedRecommendation,
    Explainer, KeywordTranslator, ProducerProfile, QueryTranslator,
};
pub use crate::engine::Recommender;
pub use crate::metrics::RecommendMetrics;
pub use crate::resolve::resolve;
pub use crate::types::{
    EngineConfig, EngineError, RecommendQuery, Recommendation, DEFAULT_TOP_N,
};
