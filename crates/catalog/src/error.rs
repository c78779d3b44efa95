//! Error types produced by the catalog crate.
//!
//! All errors are typed, cloneable, and comparable so callers (the trainer
//! and the enrichment step) can decide per variant whether a failure is
//! fatal or skippable.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`Io`](CatalogError::Io) | Source | The backing file could not be read |
//! | [`Parse`](CatalogError::Parse) | Source | The catalog document is not valid JSON for the record shape |
//! | [`InvalidRecord`](CatalogError::InvalidRecord) | Validation | A record failed normalization (e.g. blank identifier) |

use thiserror::Error;

/// Errors returned by catalog sources and record normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Reading the catalog backing store failed.
    #[error("catalog read failed: {0}")]
    Io(String),

    /// The catalog document could not be parsed.
    #[error("catalog parse failed: {0}")]
    Parse(String),

    /// A record is structurally unusable.
    #[error("invalid producer record: {0}")]
    InvalidRecord(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}
