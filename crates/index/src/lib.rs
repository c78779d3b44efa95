//! # Producer Index
//!
//! The similarity index behind the recommender and the durable storage of
//! the model it belongs to.
//!
//! ## Core Pieces
//!
//! - [`FeatureMatrix`]: row-major producer vectors, one row per producer.
//! - [`NeighborIndex`]: exact cosine k-NN over the matrix, with row norms
//!   precomputed at fit time.
//! - [`ModelSnapshot`]: everything one training run produced (vocabulary,
//!   weights, matrix, producer ids and names, fitted index, metadata). It is
//!   immutable once built and validated on construction and on decode.
//! - [`SnapshotStore`]: persists a snapshot as one compressed bincode blob
//!   plus a JSON metadata document through a pluggable [`SnapshotBackend`]:
//!   - an in-memory `HashMap` backend for tests and ephemeral use,
//!   - a directory backend writing each key as a file via temp-file + rename,
//!   - a redb backend (enabled via the `backend-redb` feature, on by default)
//!     writing both keys in one transaction.
//!
//! ## Example Usage
//!
//! ```
//! use index::{FeatureMatrix, NeighborIndex};
//!
//! let matrix = FeatureMatrix::from_rows(2, [[2.0, 0.0], [2.0, 1.0], [0.0, 1.0]]).unwrap();
//! let index = NeighborIndex::fit(&matrix, 2).unwrap();
//! let hits = index.kneighbors(&matrix, &[1.0, 0.0], None).unwrap();
//! assert_eq!(hits[0].index, 0);
//! assert_eq!(hits.len(), 2);
//! ```

mod backend;
mod matrix;
mod neighbors;
mod snapshot;
mod store;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, DirectoryBackend, InMemoryBackend, SnapshotBackend};
pub use matrix::FeatureMatrix;
pub use neighbors::{Neighbor, NeighborIndex};
pub use snapshot::{
    MetadataDocument, ModelSnapshot, ProducerRow, SnapshotMetadata, SnapshotParts,
    MODEL_VERSION_FORMAT, SNAPSHOT_SCHEMA_VERSION,
};
pub use store::{SnapshotStore, StoreConfig, DEFAULT_METADATA_KEY, DEFAULT_MODEL_KEY};

use thiserror::Error;
use zstd::{decode_all, encode_all};

/// Compression codec options for the stored model blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// No compression (useful for debugging or inspecting blobs).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

impl CompressionCodec {
    fn tag(self) -> u8 {
        match self {
            CompressionCodec::None => 0,
            CompressionCodec::Zstd => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, IndexError> {
        match tag {
            0 => Ok(CompressionCodec::None),
            1 => Ok(CompressionCodec::Zstd),
            other => Err(IndexError::Decode(format!("unknown codec tag {other}"))),
        }
    }
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    /// The compression codec used when writing.
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd, where higher = better compression but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Compresses and prefixes the payload with a one-byte codec tag, so a
    /// blob stays readable after the configured codec changes.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        let body = match self.codec {
            CompressionCodec::None => data.to_vec(),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| IndexError::Zstd(e.to_string()))?
            }
        };
        let mut framed = Vec::with_capacity(body.len() + 1);
        framed.push(self.codec.tag());
        framed.extend_from_slice(&body);
        Ok(framed)
    }

    fn decompress(data: &[u8]) -> Result<Vec<u8>, IndexError> {
        let (tag, body) = data
            .split_first()
            .ok_or_else(|| IndexError::Decode("empty blob".into()))?;
        match CompressionCodec::from_tag(*tag)? {
            CompressionCodec::None => Ok(body.to_vec()),
            CompressionCodec::Zstd => decode_all(body).map_err(|e| IndexError::Zstd(e.to_string())),
        }
    }
}

/// Errors raised by the index, the snapshot codec, and storage backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("Incompatible snapshot schema {found}; expected {expected}")]
    IncompatibleSchema { found: u16, expected: u16 },
    #[error("Cannot fit an index on an empty matrix")]
    EmptyMatrix,
    #[error("Invalid neighborhood size {requested} for {rows} rows")]
    InvalidNeighbors { requested: usize, rows: usize },
    #[error("Feature width mismatch: expected {expected}, found {found}")]
    WidthMismatch { expected: usize, found: usize },
}

impl From<bincode::error::EncodeError> for IndexError {
    fn from(e: bincode::error::EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for IndexError {
    fn from(e: bincode::error::DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Decode(format!("metadata document: {e}"))
    }
}

impl IndexError {
    pub fn backend<E: Into<String>>(msg: E) -> Self {
        IndexError::Backend(msg.into())
    }
}
