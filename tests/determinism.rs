use chrono::{TimeZone, Utc};
use harmonix::{
    active_genres, train, train_at, EngineConfig, ProducerRecord, RecommendQuery, Recommender,
    Segment, TrainingConfig,
};

fn catalog() -> Vec<ProducerRecord> {
    let genres = [
        vec!["Trap", "Hip Hop"],
        vec!["Jazz"],
        vec!["House", "Techno", "Ambient"],
        vec![],
        vec!["Hip Hop", "R&B"],
        vec!["Pop"],
        vec!["Trap"],
    ];
    genres
        .into_iter()
        .enumerate()
        .map(|(i, g)| {
            ProducerRecord::new(format!("p-{i}"), format!("Producer {i}"))
                .with_genres(g)
                .with_skills(if i % 2 == 0 { vec!["Mixing"] } else { vec!["Mastering", "Mixing"] })
                .with_tools([["FL Studio", "Ableton Live", "Logic Pro"][i % 3]])
                .with_experience(["Beginner", "Expert"][i % 2])
        })
        .collect()
}

#[test]
fn retraining_reproduces_vocabulary_and_matrix() {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let first = train_at(&catalog(), &TrainingConfig::default(), at).unwrap();
    let second = train_at(&catalog(), &TrainingConfig::default(), at).unwrap();
    assert_eq!(first.snapshot.vocabulary(), second.snapshot.vocabulary());
    assert_eq!(first.snapshot.matrix(), second.snapshot.matrix());
    assert_eq!(first.snapshot, second.snapshot);
    assert_eq!(first.outcome.model_version, "20260101_000000");
}

#[test]
fn vocabulary_lists_every_tag_once_sorted() {
    let trained = train(&catalog(), &TrainingConfig::default()).unwrap();
    let vocabulary = trained.snapshot.vocabulary();
    assert_eq!(
        vocabulary.genres(),
        ["Ambient", "Hip Hop", "House", "Jazz", "Pop", "R&B", "Techno", "Trap"]
    );
    assert_eq!(vocabulary.skills(), ["Mastering", "Mixing"]);
    assert_eq!(vocabulary.tools(), ["Ableton Live", "FL Studio", "Logic Pro"]);
    assert_eq!(vocabulary.experience_levels(), ["Beginner", "Expert"]);
    assert_eq!(vocabulary.width(), 8 + 2 + 3 + 2);
}

#[test]
fn stored_rows_decode_to_declared_genres() {
    let records = catalog();
    let trained = train(&records, &TrainingConfig::default()).unwrap();
    let snapshot = &trained.snapshot;

    for (record, row) in records.iter().zip(snapshot.producers()) {
        assert_eq!(record.id, row.id);
        let mut decoded = active_genres(row.features, snapshot.vocabulary(), snapshot.weights())
            .unwrap()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        decoded.sort();
        let mut declared = record.genres.clone();
        declared.sort();
        assert_eq!(decoded, declared, "{}", record.id);

        let genre_mass: f32 = row.features[snapshot.vocabulary().segment(Segment::Genre)]
            .iter()
            .sum();
        assert!(genre_mass <= 2.0 * record.genres.len() as f32 + 1e-6);
    }
}

#[test]
fn identical_engines_answer_identically() {
    let query = RecommendQuery::new()
        .with_genres(["Hip Hop", "Trap"])
        .with_skills(["Mixing"])
        .with_tools(["FL Studio"])
        .with_top_n(5);

    let answers: Vec<_> = (0..3)
        .map(|_| {
            let engine = Recommender::new(EngineConfig::default()).unwrap();
            engine.train(&catalog()).unwrap();
            engine.recommend(&query).unwrap()
        })
        .collect();
    assert_eq!(answers[0], answers[1]);
    assert_eq!(answers[1], answers[2]);
}

#[test]
fn parallel_training_matches_serial() {
    let at = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    let serial = train_at(&catalog(), &TrainingConfig::default(), at).unwrap();
    let parallel = train_at(
        &catalog(),
        &TrainingConfig::default().with_parallel(true),
        at,
    )
    .unwrap();
    assert_eq!(serial.snapshot.matrix(), parallel.snapshot.matrix());
    assert_eq!(
        serial.outcome.avg_similarity,
        parallel.outcome.avg_similarity
    );
}
