//! The two-stage match-then-rank resolver.
//!
//! 1. **Genre gate**: a producer is a candidate only if at least one requested
//!    genre is among the genres decoded from its stored row.
//! 2. **Scoring**: `cosine(query, row) × (1 + matched / requested)`, where
//!    `requested` counts every distinct requested genre, known to the
//!    vocabulary or not. Repeats of a genre count once, which keeps the
//!    boost within `[0, 1]`.
//! 3. **Ranking**: stable sort by descending score (ties keep catalog order),
//!    truncated to `top_n`.
//!
//! Resolution never fails as a whole. A candidate whose row cannot be scored
//! is dropped and logged.

use std::cmp::Ordering;

use encoder::{active_genres, encode_query};
use index::ModelSnapshot;
use tracing::debug;

use crate::types::{RecommendQuery, Recommendation};

/// Ranks the snapshot's producers against `query`.
///
/// An empty requested genre list lets no producer through the gate, so the
/// result is empty.
pub fn resolve(snapshot: &ModelSnapshot, query: &RecommendQuery, top_n: usize) -> Vec<Recommendation> {
    let query = query.normalized();
    if query.genres.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let vocabulary = snapshot.vocabulary();
    let weights = snapshot.weights();
    let query_vector = encode_query(
        &query.genres,
        &query.skills,
        &query.tools,
        query.experience.as_deref(),
        vocabulary,
        weights,
    );
    let requested = query.genres.len() as f32;

    let mut hits = Vec::new();
    for producer in snapshot.producers() {
        let declared = match active_genres(producer.features, vocabulary, weights) {
            Ok(genres) => genres,
            Err(err) => {
                debug!(producer_id = producer.id, error = %err, "candidate_dropped");
                continue;
            }
        };
        let matching_genres: Vec<String> = query
            .genres
            .iter()
            .filter(|genre| declared.contains(&genre.as_str()))
            .cloned()
            .collect();
        if matching_genres.is_empty() {
            continue;
        }

        let similarity = match query_vector.cosine(producer.features) {
            Ok(similarity) => similarity,
            Err(err) => {
                debug!(producer_id = producer.id, error = %err, "candidate_dropped");
                continue;
            }
        };
        let boost = matching_genres.len() as f32 / requested;
        let score = similarity * (1.0 + boost);
        if !score.is_finite() {
            debug!(producer_id = producer.id, score, "candidate_dropped");
            continue;
        }

        hits.push(Recommendation {
            producer_id: producer.id.to_string(),
            name: producer.name.to_string(),
            score,
            matching_genres,
        });
    }

    // `sort_by` is stable: equal scores keep catalog order.
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(top_n);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::ProducerRecord;
    use trainer::{train, TrainingConfig};

    fn snapshot(records: &[ProducerRecord]) -> ModelSnapshot {
        train(records, &TrainingConfig::default()).unwrap().snapshot
    }

    fn catalog() -> Vec<ProducerRecord> {
        vec![
            ProducerRecord::new("a", "Ada")
                .with_genres(["Hip Hop", "Trap"])
                .with_skills(["Mixing"]),
            ProducerRecord::new("b", "Bo")
                .with_genres(["Trap"])
                .with_skills(["Mastering"]),
            ProducerRecord::new("c", "Cy").with_genres(["Jazz"]),
            ProducerRecord::new("d", "Di")
                .with_genres(["Hip Hop"])
                .with_skills(["Mixing"])
                .with_tools(["FL Studio"]),
            ProducerRecord::new("e", "Ed").with_skills(["Mixing"]),
        ]
    }

    #[test]
    fn genre_gate_excludes_non_matching_producers() {
        let snap = snapshot(&catalog());
        let hits = resolve(&snap, &RecommendQuery::new().with_genres(["Jazz"]), 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].producer_id, "c");
        assert_eq!(hits[0].matching_genres, vec!["Jazz"]);
        // identical vectors, full match: 1.0 × (1 + 1)
        assert!((hits[0].score - 2.0).abs() < 1e-5);
    }

    #[test]
    fn matching_genres_follow_request_order() {
        let snap = snapshot(&catalog());
        let hits = resolve(
            &snap,
            &RecommendQuery::new().with_genres(["Trap", "Hip Hop"]),
            10,
        );
        assert_eq!(hits[0].producer_id, "a");
        assert_eq!(hits[0].matching_genres, vec!["Trap", "Hip Hop"]);
    }

    #[test]
    fn boost_counts_unknown_requested_genres() {
        let snap = snapshot(&catalog());
        let hits = resolve(
            &snap,
            &RecommendQuery::new().with_genres(["Jazz", "Polka"]),
            10,
        );
        assert_eq!(hits.len(), 1);
        // cosine 1.0 (Polka is not encoded), boost 1/2
        assert!((hits[0].score - 1.5).abs() < 1e-5);
    }

    #[test]
    fn repeated_requested_genres_count_once() {
        let snap = snapshot(&catalog());
        let repeated = resolve(
            &snap,
            &RecommendQuery::new().with_genres(["Jazz", "Jazz ", "Jazz", "Polka"]),
            10,
        );
        let plain = resolve(
            &snap,
            &RecommendQuery::new().with_genres(["Jazz", "Polka"]),
            10,
        );
        assert_eq!(repeated, plain);
        assert_eq!(repeated[0].matching_genres, vec!["Jazz"]);
    }

    #[test]
    fn ranks_by_score_and_truncates() {
        let snap = snapshot(&catalog());
        let query = RecommendQuery::new()
            .with_genres(["Hip Hop"])
            .with_skills(["Mixing"]);
        let all = resolve(&snap, &query, 10);
        let ids: Vec<_> = all.iter().map(|h| h.producer_id.as_str()).collect();
        // d is closer in angle (its extra tool weighs less than a's extra genre)
        assert_eq!(ids, vec!["d", "a"]);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(resolve(&snap, &query, 1).len(), 1);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let records: Vec<_> = (0..5)
            .map(|i| ProducerRecord::new(format!("p-{i}"), "Twin").with_genres(["Trap"]))
            .collect();
        let snap = snapshot(&records);
        let hits = resolve(&snap, &RecommendQuery::new().with_genres(["Trap"]), 3);
        let ids: Vec<_> = hits.iter().map(|h| h.producer_id.as_str()).collect();
        assert_eq!(ids, vec!["p-0", "p-1", "p-2"]);
    }

    // Nothing passes the gate without a requested genre, even when skills
    // would match.
    #[test]
    fn empty_genre_list_yields_no_results() {
        let snap = snapshot(&catalog());
        let hits = resolve(&snap, &RecommendQuery::new().with_skills(["Mixing"]), 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn unknown_genres_only_yield_no_results() {
        let snap = snapshot(&catalog());
        let hits = resolve(&snap, &RecommendQuery::new().with_genres(["Polka"]), 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn zero_top_n_is_empty() {
        let snap = snapshot(&catalog());
        assert!(resolve(&snap, &RecommendQuery::new().with_genres(["Trap"]), 0).is_empty());
    }

    #[test]
    fn scores_stay_within_bounds() {
        let snap = snapshot(&catalog());
        let query = RecommendQuery::new()
            .with_genres(["Trap", "Hip Hop", "Jazz"])
            .with_skills(["Mixing", "Mastering"])
            .with_tools(["FL Studio"]);
        for hit in resolve(&snap, &query, 10) {
            assert!((0.0..=2.0 + 1e-5).contains(&hit.score), "{hit:?}");
        }
    }
}
