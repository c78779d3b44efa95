//! Encoding of producers and queries into weighted presence vectors, and the
//! inverse genre decoding used by the resolver's genre gate.
//!
//! Layout of a vector for a vocabulary with `g` genres, `s` skills, `t`
//! tools, and `e` experience levels:
//!
//! ```text
//! [ genre_0 .. genre_g | skill_0 .. skill_s | tool_0 .. tool_t | exp_0 .. exp_e ]
//!   weight 2.0           weight 2.0           weight 1.0         one-hot 1.0
//! ```
//!
//! Encoding and decoding share [`FeatureWeights`] so the decoding threshold
//! always tracks the weight that was actually written.

use catalog::ProducerRecord;
use serde::{Deserialize, Serialize};

use crate::config::{EncodeError, FeatureWeights};
use crate::vocabulary::{Segment, Vocabulary};

/// A dense feature vector tied to the width of the vocabulary it was built
/// against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn zeros(width: usize) -> Self {
        Self(vec![0.0; width])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f64 {
        norm(&self.0)
    }

    /// Rejects vectors built against a vocabulary of another width.
    pub fn ensure_width(&self, expected: usize) -> Result<(), EncodeError> {
        ensure_width(&self.0, expected)
    }

    /// Cosine similarity against a row of the same width.
    pub fn cosine(&self, row: &[f32]) -> Result<f32, EncodeError> {
        ensure_width(row, self.0.len())?;
        Ok(cosine_similarity(&self.0, row))
    }

    fn set(&mut self, column: usize, weight: f32) {
        if let Some(slot) = self.0.get_mut(column) {
            *slot = weight;
        }
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Encodes a producer's declared tags. Tags outside the vocabulary are
/// ignored.
pub fn encode_producer(
    record: &ProducerRecord,
    vocabulary: &Vocabulary,
    weights: &FeatureWeights,
) -> FeatureVector {
    encode_query(
        &record.genres,
        &record.skills,
        &record.tools,
        record.experience.as_deref(),
        vocabulary,
        weights,
    )
}

/// Encodes requested tags the same way a producer is encoded.
pub fn encode_query<S: AsRef<str>>(
    genres: &[S],
    skills: &[S],
    tools: &[S],
    experience: Option<&str>,
    vocabulary: &Vocabulary,
    weights: &FeatureWeights,
) -> FeatureVector {
    let mut vector = FeatureVector::zeros(vocabulary.width());
    for (segment, tags, weight) in [
        (Segment::Genre, genres, weights.genre),
        (Segment::Skill, skills, weights.skill),
        (Segment::Tool, tools, weights.tool),
    ] {
        for tag in tags {
            if let Some(column) = vocabulary.column(segment, tag.as_ref()) {
                vector.set(column, weight);
            }
        }
    }
    if let Some(column) = experience.and_then(|e| vocabulary.column(Segment::Experience, e)) {
        vector.set(column, weights.experience);
    }
    vector
}

/// Genres whose stored dimension exceeds the activation threshold, in
/// vocabulary order.
pub fn active_genres<'v>(
    row: &[f32],
    vocabulary: &'v Vocabulary,
    weights: &FeatureWeights,
) -> Result<Vec<&'v str>, EncodeError> {
    ensure_width(row, vocabulary.width())?;
    let threshold = weights.genre_threshold();
    let range = vocabulary.segment(Segment::Genre);
    Ok(vocabulary
        .genres()
        .iter()
        .zip(&row[range])
        .filter(|(_, value)| **value > threshold)
        .map(|(genre, _)| genre.as_str())
        .collect())
}

/// Cosine similarity, or 0 when either vector has zero norm.
///
/// Both slices must have the same length; extra trailing values of the
/// longer slice are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    (dot / (na * nb)) as f32
}

pub fn norm(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt()
}

fn ensure_width(values: &[f32], expected: usize) -> Result<(), EncodeError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(EncodeError::WidthMismatch {
            expected,
            found: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ProducerRecord> {
        vec![
            ProducerRecord::new("p-1", "Ada")
                .with_genres(["Hip Hop", "Trap"])
                .with_skills(["Mixing"])
                .with_tools(["FL Studio"])
                .with_experience("Expert"),
            ProducerRecord::new("p-2", "Bo")
                .with_genres(["Jazz"])
                .with_skills(["Mastering"])
                .with_experience("Beginner"),
        ]
    }

    #[test]
    fn producer_vector_uses_segment_weights() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let v = encode_producer(&records[0], &vocab, &FeatureWeights::default());
        // genres [Hip Hop, Jazz, Trap] | skills [Mastering, Mixing] | tools [FL Studio] | exp [Beginner, Expert]
        assert_eq!(
            v.as_slice(),
            &[2.0, 0.0, 2.0, 0.0, 2.0, 1.0, 0.0, 1.0]
        );
        assert_eq!(v.len(), vocab.width());
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let v = encode_query(
            &["Polka"],
            &["Yodel"],
            &["Kazoo"],
            Some("Legend"),
            &vocab,
            &FeatureWeights::default(),
        );
        assert!(v.as_slice().iter().all(|x| *x == 0.0));
        assert_eq!(v.norm(), 0.0);
    }

    #[test]
    fn decoding_recovers_declared_in_vocabulary_genres() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let weights = FeatureWeights::default();
        let v = encode_producer(&records[0], &vocab, &weights);
        let genres = active_genres(v.as_slice(), &vocab, &weights).unwrap();
        assert_eq!(genres, vec!["Hip Hop", "Trap"]);
    }

    #[test]
    fn decoding_tracks_custom_genre_weight() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let weights = FeatureWeights::default().with_genre(3.0);
        let v = encode_producer(&records[1], &vocab, &weights);
        assert_eq!(active_genres(v.as_slice(), &vocab, &weights).unwrap(), vec!["Jazz"]);
    }

    #[test]
    fn active_genre_mass_is_bounded_by_declared_genres() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let weights = FeatureWeights::default();
        for record in &records {
            let v = encode_producer(record, &vocab, &weights);
            let mass: f32 = v.as_slice()[vocab.segment(Segment::Genre)].iter().sum();
            assert!(mass <= weights.genre * record.genres.len() as f32);
        }
    }

    #[test]
    fn stale_row_is_rejected() {
        let records = catalog();
        let vocab = Vocabulary::from_records(&records);
        let err = active_genres(&[2.0, 0.0], &vocab, &FeatureWeights::default()).unwrap_err();
        assert_eq!(
            err,
            EncodeError::WidthMismatch {
                expected: 8,
                found: 2
            }
        );
        let query = FeatureVector::zeros(8);
        assert!(query.cosine(&[1.0; 7]).is_err());
    }

    #[test]
    fn cosine_handles_zero_norm_and_identity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 1.0], &[2.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
