//! Encoding weights and error types for the feature encoder.
//!
//! Weights are part of the model: the trainer stores the exact values it
//! encoded with in the snapshot, and the resolver decodes with the same
//! values. Nothing here touches I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance subtracted from the genre weight when deciding whether a genre
/// dimension is active. With the default weight of 2.0 the cut-off is 1.9.
pub const ACTIVATION_TOLERANCE: f32 = 0.1;

/// Per-segment presence weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureWeights {
    /// Weight of a declared genre. Genres gate recommendations, so the value
    /// also defines the decoding threshold.
    pub genre: f32,
    /// Weight of a declared skill.
    pub skill: f32,
    /// Weight of a declared tool.
    pub tool: f32,
    /// Weight of the single active experience level.
    pub experience: f32,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            genre: 2.0,
            skill: 2.0,
            tool: 1.0,
            experience: 1.0,
        }
    }
}

impl FeatureWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genre(mut self, weight: f32) -> Self {
        self.genre = weight;
        self
    }

    pub fn with_skill(mut self, weight: f32) -> Self {
        self.skill = weight;
        self
    }

    pub fn with_tool(mut self, weight: f32) -> Self {
        self.tool = weight;
        self
    }

    pub fn with_experience(mut self, weight: f32) -> Self {
        self.experience = weight;
        self
    }

    /// Value above which a stored genre dimension counts as declared.
    pub fn genre_threshold(&self) -> f32 {
        self.genre - ACTIVATION_TOLERANCE
    }

    pub fn validate(&self) -> Result<(), EncodeError> {
        for (name, value) in [
            ("genre", self.genre),
            ("skill", self.skill),
            ("tool", self.tool),
            ("experience", self.experience),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EncodeError::InvalidWeights(format!(
                    "{name} weight must be finite and > 0 (got {value})"
                )));
            }
        }
        if self.genre <= ACTIVATION_TOLERANCE {
            return Err(EncodeError::InvalidWeights(format!(
                "genre weight must exceed {ACTIVATION_TOLERANCE} (got {})",
                self.genre
            )));
        }
        Ok(())
    }
}

/// Errors returned by the feature encoder.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    /// A vector was built against a different vocabulary than the one in use.
    #[error("feature width mismatch: expected {expected}, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("invalid feature weights: {0}")]
    InvalidWeights(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights() {
        let w = FeatureWeights::default();
        assert_eq!(w.genre, 2.0);
        assert_eq!(w.skill, 2.0);
        assert_eq!(w.tool, 1.0);
        assert_eq!(w.experience, 1.0);
        assert!((w.genre_threshold() - 1.9).abs() < 1e-6);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_and_nan() {
        assert!(FeatureWeights::new().with_tool(0.0).validate().is_err());
        assert!(FeatureWeights::new().with_skill(f32::NAN).validate().is_err());
    }

    #[test]
    fn rejects_genre_weight_below_tolerance() {
        let err = FeatureWeights::new().with_genre(0.05).validate().unwrap_err();
        assert!(matches!(err, EncodeError::InvalidWeights(_)));
    }
}
