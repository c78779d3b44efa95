//! # Producer Feature Encoder
//!
//! Turns producer tag sets and requested tags into fixed-width weighted
//! presence vectors over a [`Vocabulary`] derived from the catalog.
//!
//! The encoder is a pure function of `(tags, vocabulary, weights)`: the same
//! inputs always produce the same vector, and a vector is only comparable
//! with rows built against a vocabulary of the same width.
//!
//! ```
//! use catalog::ProducerRecord;
//! use encoder::{active_genres, encode_producer, encode_query, FeatureWeights, Vocabulary};
//!
//! let producers = vec![
//!     ProducerRecord::new("p-1", "Ada").with_genres(["Trap"]).with_skills(["Mixing"]),
//!     ProducerRecord::new("p-2", "Bo").with_genres(["Jazz"]),
//! ];
//! let vocab = Vocabulary::from_records(&producers);
//! let weights = FeatureWeights::default();
//!
//! let row = encode_producer(&producers[0], &vocab, &weights);
//! assert_eq!(active_genres(row.as_slice(), &vocab, &weights).unwrap(), vec!["Trap"]);
//!
//! let query = encode_query(&["Trap"], &[], &[], None, &vocab, &weights);
//! assert!(query.cosine(row.as_slice()).unwrap() > 0.0);
//! ```

mod config;
mod encode;
mod vocabulary;

pub use config::{EncodeError, FeatureWeights, ACTIVATION_TOLERANCE};
pub use encode::{
    active_genres, cosine_similarity, encode_producer, encode_query, norm, FeatureVector,
};
pub use vocabulary::{Segment, Vocabulary};
