//! Record normalization applied before a catalog reaches the encoder.
//!
//! ```text
//! ProducerRecord (raw)
//!        │
//!        ▼
//! ┌─────────────────────────────┐
//! │ 1. Sanitize strings         │
//! │    - Strip control chars    │
//! │    - Trim whitespace        │
//! ├─────────────────────────────┤
//! │ 2. Tag lists                │
//! │    - Drop empty tags        │
//! │    - Dedupe, keep order     │
//! ├─────────────────────────────┤
//! │ 3. Validate                 │
//! │    - Non-empty id           │
//! └─────────────────────────────┘
//!        │
//!        ▼
//! ProducerRecord (normalized)
//! ```
//!
//! Normalization never changes tag case: vocabulary terms are matched
//! exactly, so `"Hip Hop"` and `"hip hop"` remain distinct entries.

use std::collections::HashSet;

use crate::{CatalogError, ProducerRecord};

/// Normalizes one record, failing only when the identifier is unusable.
pub fn normalize_record(record: ProducerRecord) -> Result<ProducerRecord, CatalogError> {
    let id = sanitize_required_field("id", &record.id)?;
    Ok(ProducerRecord {
        id,
        full_name: sanitize_optional_string(Some(record.full_name)).unwrap_or_default(),
        genres: normalize_tags(record.genres),
        skills: normalize_tags(record.skills),
        tools: normalize_tags(record.tools),
        experience: sanitize_optional_string(record.experience),
        about: sanitize_optional_string(record.about),
        country: sanitize_optional_string(record.country),
        profile_image: sanitize_optional_string(record.profile_image),
        featured_tracks: record.featured_tracks,
    })
}

/// Normalizes every record, stopping at the first invalid one.
pub fn normalize_records<I>(records: I) -> Result<Vec<ProducerRecord>, CatalogError>
where
    I: IntoIterator<Item = ProducerRecord>,
{
    records.into_iter().map(normalize_record).collect()
}

/// Trims tags, drops empty ones, and removes duplicates keeping the first.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter_map(|tag| sanitize_optional_string(Some(tag.as_ref().to_owned())))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

pub(crate) fn sanitize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let filtered: String = raw.chars().filter(|c| !c.is_control()).collect();
        let trimmed = filtered.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn sanitize_required_field(field: &str, value: &str) -> Result<String, CatalogError> {
    sanitize_optional_string(Some(value.to_owned()))
        .ok_or_else(|| CatalogError::InvalidRecord(format!("{field} empty")))
}
