//! Free-text query translation and result enrichment.
//!
//! Both collaborators are optional and pluggable:
//!
//! - a [`QueryTranslator`] turns free text into a [`RecommendQuery`]. Its
//!   output is always passed through [`constrain_to_vocabulary`], so a
//!   translator backed by a language model cannot smuggle in tags the model
//!   has never seen;
//! - an [`Explainer`] writes a short reason for each recommendation. Its
//!   failures never fail the request; the reason is simply left empty.
//!
//! [`KeywordTranslator`] is the built-in, dependency-free translator.

use async_trait::async_trait;
use catalog::{normalize_tags, CatalogError, CatalogSource, ProducerRecord};
use encoder::{Segment, Vocabulary};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::types::{RecommendQuery, Recommendation};

/// Errors reported by translators and explainers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistError {
    #[error("assistant unavailable: {0}")]
    Unavailable(String),
    #[error("assistant failed: {0}")]
    Failed(String),
}

/// Converts free text into a structured query over `vocabulary`.
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
    ) -> Result<RecommendQuery, AssistError>;
}

/// Produces a human-readable reason for one recommendation.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(
        &self,
        producer: &ProducerRecord,
        query_text: &str,
        matching_genres: &[String],
    ) -> Result<String, AssistError>;
}

/// Picks vocabulary terms that appear in the text as whole words,
/// ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTranslator;

#[async_trait]
impl QueryTranslator for KeywordTranslator {
    async fn translate(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
    ) -> Result<RecommendQuery, AssistError> {
        let haystack = text.to_lowercase();
        let find = |segment| -> Vec<String> {
            vocabulary
                .terms(segment)
                .iter()
                .filter(|term| contains_phrase(&haystack, &term.to_lowercase()))
                .cloned()
                .collect()
        };
        Ok(RecommendQuery {
            genres: find(Segment::Genre),
            skills: find(Segment::Skill),
            tools: find(Segment::Tool),
            experience: find(Segment::Experience).into_iter().next(),
            top_n: None,
        })
    }
}

fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Maps every tag onto its canonical vocabulary spelling (case-insensitive)
/// and drops tags the vocabulary does not know.
pub fn constrain_to_vocabulary(query: RecommendQuery, vocabulary: &Vocabulary) -> RecommendQuery {
    let canonical = |segment: Segment, tag: &str| -> Option<String> {
        let tag = tag.trim();
        vocabulary
            .terms(segment)
            .iter()
            .find(|term| term.as_str() == tag)
            .or_else(|| {
                let lowered = tag.to_lowercase();
                vocabulary
                    .terms(segment)
                    .iter()
                    .find(|term| term.to_lowercase() == lowered)
            })
            .cloned()
    };
    let constrain = |segment: Segment, tags: &[String]| -> Vec<String> {
        normalize_tags(tags.iter().filter_map(|t| canonical(segment, t)))
    };
    RecommendQuery {
        genres: constrain(Segment::Genre, &query.genres),
        skills: constrain(Segment::Skill, &query.skills),
        tools: constrain(Segment::Tool, &query.tools),
        experience: query
            .experience
            .as_deref()
            .and_then(|e| canonical(Segment::Experience, e)),
        top_n: query.top_n,
    }
}

/// A recommendation joined with the producer's catalog record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecommendation {
    #[serde(flatten)]
    pub producer: ProducerRecord,
    pub similarity_score: f32,
    pub matching_genres: Vec<String>,
    /// Featured tracks rendered as display strings.
    pub featured_track_titles: Vec<String>,
    pub reason: Option<String>,
}

/// A catalog record prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerProfile {
    #[serde(flatten)]
    pub producer: ProducerRecord,
    pub featured_track_titles: Vec<String>,
}

/// Finds a producer by identifier, falling back to a case-insensitive name
/// match.
pub fn lookup_producer(
    catalog: &dyn CatalogSource,
    key: &str,
) -> Result<Option<ProducerProfile>, CatalogError> {
    let key = key.trim();
    Ok(catalog
        .producer_by_id_or_name(key)?
        .map(|producer| ProducerProfile {
            featured_track_titles: producer.featured_track_titles(),
            producer,
        }))
}

/// Looks every recommended producer up in the catalog, in rank order.
///
/// Producers that left the catalog since training, or whose lookup fails,
/// are skipped. Explainer failures leave `reason` empty.
pub async fn enrich(
    recommendations: &[Recommendation],
    catalog: &dyn CatalogSource,
    explainer: Option<&dyn Explainer>,
    query_text: &str,
) -> Vec<EnrichedRecommendation> {
    let mut enriched = Vec::with_capacity(recommendations.len());
    for rec in recommendations {
        let producer = match catalog.producer_by_id(&rec.producer_id) {
            Ok(Some(producer)) => producer,
            Ok(None) => {
                warn!(producer_id = %rec.producer_id, "enrich_producer_missing");
                continue;
            }
            Err(err) => {
                warn!(producer_id = %rec.producer_id, error = %err, "enrich_lookup_failure");
                continue;
            }
        };

        let reason = match explainer {
            Some(explainer) => {
                match explainer
                    .explain(&producer, query_text, &rec.matching_genres)
                    .await
                {
                    Ok(reason) => Some(reason),
                    Err(err) => {
                        warn!(producer_id = %rec.producer_id, error = %err, "explain_failure");
                        None
                    }
                }
            }
            None => None,
        };

        enriched.push(EnrichedRecommendation {
            featured_track_titles: producer.featured_track_titles(),
            producer,
            similarity_score: rec.score,
            matching_genres: rec.matching_genres.clone(),
            reason,
        });
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{FeaturedTrack, InMemoryCatalog};

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_parts(
            ["Hip Hop", "Jazz", "R&B"].map(String::from),
            ["Mixing"].map(String::from),
            ["FL Studio"].map(String::from),
            ["Beginner", "Expert"].map(String::from),
        )
    }

    #[tokio::test]
    async fn keyword_translator_matches_whole_terms() {
        let query = KeywordTranslator
            .translate(
                "Need an EXPERT hip hop producer for mixing in fl studio, not jazzy",
                &vocabulary(),
            )
            .await
            .unwrap();
        assert_eq!(query.genres, vec!["Hip Hop"]);
        assert_eq!(query.skills, vec!["Mixing"]);
        assert_eq!(query.tools, vec!["FL Studio"]);
        assert_eq!(query.experience.as_deref(), Some("Expert"));
    }

    #[test]
    fn phrase_boundaries() {
        assert!(contains_phrase("some r&b vibes", "r&b"));
        assert!(!contains_phrase("jazzy", "jazz"));
        assert!(contains_phrase("jazz.", "jazz"));
        assert!(!contains_phrase("anything", ""));
    }

    #[test]
    fn constraint_restores_spelling_and_drops_unknown_tags() {
        let raw = RecommendQuery::new()
            .with_genres(["hip hop", "Polka", "JAZZ", "Hip Hop"])
            .with_skills(["mixing", "Yodel"])
            .with_experience("legend")
            .with_top_n(5);
        let constrained = constrain_to_vocabulary(raw, &vocabulary());
        assert_eq!(constrained.genres, vec!["Hip Hop", "Jazz"]);
        assert_eq!(constrained.skills, vec!["Mixing"]);
        assert_eq!(constrained.experience, None);
        assert_eq!(constrained.top_n, Some(5));
    }

    struct FixedExplainer;

    #[async_trait]
    impl Explainer for FixedExplainer {
        async fn explain(
            &self,
            producer: &ProducerRecord,
            _query_text: &str,
            matching_genres: &[String],
        ) -> Result<String, AssistError> {
            if producer.id == "b" {
                return Err(AssistError::Unavailable("rate limited".into()));
            }
            Ok(format!("{} covers {}", producer.full_name, matching_genres.join(", ")))
        }
    }

    fn rec(id: &str, score: f32) -> Recommendation {
        Recommendation {
            producer_id: id.into(),
            name: id.to_uppercase(),
            score,
            matching_genres: vec!["Jazz".into()],
        }
    }

    #[tokio::test]
    async fn enrich_joins_catalog_and_tolerates_failures() {
        let catalog = InMemoryCatalog::new(vec![
            ProducerRecord::new("a", "Ada").with_featured_tracks([
                FeaturedTrack::Title("Intro".into()),
                FeaturedTrack::Detailed {
                    title: Some("Blue".into()),
                    artist: Some("Ada".into()),
                },
            ]),
            ProducerRecord::new("b", "Bo"),
        ])
        .unwrap();
        let recs = vec![rec("a", 1.5), rec("gone", 1.2), rec("b", 1.0)];

        let enriched = enrich(&recs, &catalog, Some(&FixedExplainer), "jazz please").await;
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].producer.id, "a");
        assert_eq!(enriched[0].reason.as_deref(), Some("Ada covers Jazz"));
        assert_eq!(enriched[0].featured_track_titles, vec!["Intro", "Ada - Blue"]);
        assert_eq!(enriched[1].producer.id, "b");
        assert_eq!(enriched[1].reason, None);
        assert_eq!(enriched[1].similarity_score, 1.0);
    }

    fn lookup_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![
            ProducerRecord::new("p-7", "Ada Beats")
                .with_featured_tracks([FeaturedTrack::Title("Intro".into())]),
            ProducerRecord::new("p-8", "Bo Keys"),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_finds_producer_by_id() {
        let profile = lookup_producer(&lookup_catalog(), "p-7").unwrap().unwrap();
        assert_eq!(profile.producer.full_name, "Ada Beats");
        assert_eq!(profile.featured_track_titles, vec!["Intro"]);
    }

    #[test]
    fn lookup_falls_back_to_name() {
        let profile = lookup_producer(&lookup_catalog(), " bo keys ").unwrap().unwrap();
        assert_eq!(profile.producer.id, "p-8");
        assert!(lookup_producer(&lookup_catalog(), "Cy").unwrap().is_none());
    }

    #[tokio::test]
    async fn enrich_without_explainer_leaves_reason_empty() {
        let catalog = InMemoryCatalog::new(vec![ProducerRecord::new("a", "Ada")]).unwrap();
        let enriched = enrich(&[rec("a", 2.0)], &catalog, None, "").await;
        assert_eq!(enriched.len(), 1);
        assert!(enriched[0].reason.is_none());
        let json = serde_json::to_value(&enriched[0]).unwrap();
        assert_eq!(json["_id"], "a");
        assert_eq!(json["similarity_score"], 2.0);
    }
}
