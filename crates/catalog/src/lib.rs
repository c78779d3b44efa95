//! # Producer Catalog
//!
//! Record types and read-only sources for the producer catalog consumed by
//! the recommender.
//!
//! - [`ProducerRecord`] mirrors the catalog document shape (`_id`,
//!   `fullName`, tag lists, experience, profile fields).
//! - [`CatalogSource`] is the seam the trainer reads from and the
//!   enrichment step looks producers up through. [`InMemoryCatalog`] and
//!   [`JsonFileCatalog`] are provided.
//! - [`normalize_record`] trims and de-duplicates tags and rejects records
//!   without an identifier. Every source returns normalized records.
//!
//! ```
//! use catalog::{CatalogSource, InMemoryCatalog, ProducerRecord};
//!
//! let catalog = InMemoryCatalog::new(vec![
//!     ProducerRecord::new("p-1", "Ada Beats").with_genres([" Trap ", "Trap"]),
//! ])
//! .unwrap();
//! let ada = catalog.producer_by_id("p-1").unwrap().unwrap();
//! assert_eq!(ada.genres, vec!["Trap"]);
//! ```

mod error;
mod normalize;
mod source;
mod types;

pub use error::CatalogError;
pub use normalize::{normalize_record, normalize_records, normalize_tags};
pub use source::{CatalogSource, InMemoryCatalog, JsonFileCatalog};
pub use types::{FeaturedTrack, ProducerRecord};
