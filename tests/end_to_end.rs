use harmonix::{
    enrich, EngineConfig, FeaturedTrack, InMemoryCatalog, KeywordTranslator, ProducerRecord,
    RecommendQuery, Recommender,
};

fn studio_catalog() -> Vec<ProducerRecord> {
    vec![
        ProducerRecord::new("p-1", "Dana Keys")
            .with_genres(["Hip Hop", "R&B"])
            .with_skills(["Beat Making"])
            .with_tools(["FL Studio"])
            .with_experience("3-5 years"),
        ProducerRecord::new("p-2", "Miles Blue")
            .with_genres(["Jazz"])
            .with_skills(["Mixing"])
            .with_tools(["Cubase"])
            .with_experience("1-2 years")
            .with_featured_tracks([FeaturedTrack::Detailed {
                title: Some("Late Set".into()),
                artist: Some("Miles Blue".into()),
            }]),
        ProducerRecord::new("p-3", "Volt")
            .with_genres(["Techno", "House"])
            .with_skills(["Sound Design"])
            .with_tools(["Ableton Live"]),
        ProducerRecord::new("p-4", "Rosa")
            .with_genres(["Pop"])
            .with_skills(["Vocal Production", "Mixing"])
            .with_tools(["Logic Pro"])
            .with_experience("5+ years"),
        ProducerRecord::new("p-5", "Kid Trap")
            .with_genres(["Trap", "Hip Hop"])
            .with_skills(["Beat Making", "Mixing"])
            .with_tools(["FL Studio"])
            .with_experience("1-2 years"),
    ]
}

#[test]
fn jazz_mixer_is_recommended_first() {
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    let outcome = engine.train(&studio_catalog()).unwrap();
    assert_eq!(outcome.dataset_size, 5);
    assert_eq!(outcome.n_neighbors, 5);

    let query = RecommendQuery::new()
        .with_genres(["Jazz"])
        .with_skills(["Mixing"])
        .with_top_n(3);
    let hits = engine.recommend(&query).unwrap();

    assert_eq!(hits[0].producer_id, "p-2");
    assert_eq!(hits[0].name, "Miles Blue");
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[0].matching_genres, vec!["Jazz"]);
    assert!(hits.len() <= 3);
}

#[test]
fn absent_genre_is_empty_not_an_error() {
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    engine.train(&studio_catalog()).unwrap();
    let hits = engine
        .recommend(&RecommendQuery::new().with_genres(["Polka"]))
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn genre_gate_holds_for_every_hit() {
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    let catalog = studio_catalog();
    engine.train(&catalog).unwrap();

    for genre in ["Hip Hop", "Jazz", "Techno", "Pop", "Trap", "R&B", "House"] {
        let hits = engine
            .recommend(&RecommendQuery::new().with_genres([genre]).with_top_n(10))
            .unwrap();
        assert!(!hits.is_empty(), "{genre}");
        for hit in hits {
            let producer = catalog.iter().find(|p| p.id == hit.producer_id).unwrap();
            assert!(producer.genres.iter().any(|g| g == genre), "{genre}: {hit:?}");
        }
    }
}

// Skill-only requests never pass the genre gate, even though skills are
// part of the encoded vector.
#[test]
fn empty_genre_list_returns_nothing() {
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    engine.train(&studio_catalog()).unwrap();
    let hits = engine
        .recommend(
            &RecommendQuery::new()
                .with_skills(["Mixing"])
                .with_tools(["Cubase"]),
        )
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn equal_scores_keep_catalog_order() {
    let mut catalog = studio_catalog();
    // two indistinguishable producers, the later one listed first
    catalog.push(ProducerRecord::new("twin-b", "Twin B").with_genres(["Drill"]));
    catalog.push(ProducerRecord::new("twin-a", "Twin A").with_genres(["Drill"]));

    let engine = Recommender::new(EngineConfig::default()).unwrap();
    engine.train(&catalog).unwrap();
    let hits = engine
        .recommend(&RecommendQuery::new().with_genres(["Drill"]))
        .unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.producer_id.as_str()).collect();
    assert_eq!(ids, vec!["twin-b", "twin-a"]);
    assert_eq!(hits[0].score, hits[1].score);
}

#[tokio::test]
async fn free_text_query_is_enriched_from_the_catalog() {
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    let source = InMemoryCatalog::new(studio_catalog()).unwrap();
    engine.train_from(&source).unwrap();

    let text = "I need someone for jazz mixing in Cubase";
    let hits = engine.recommend_text(text, &KeywordTranslator).await.unwrap();
    assert_eq!(hits[0].producer_id, "p-2");

    let enriched = enrich(&hits, &source, None, text).await;
    assert_eq!(enriched[0].producer.full_name, "Miles Blue");
    assert_eq!(enriched[0].featured_track_titles, vec!["Miles Blue - Late Set"]);
    assert_eq!(enriched[0].similarity_score, hits[0].score);
}

#[test]
fn catalog_json_documents_train_directly() {
    let json = r#"[
        {"_id": "a", "fullName": "Ada", "genres": ["Jazz"], "skills": ["Mixing"], "tools": null},
        {"_id": "b", "fullName": "Bo", "genres": ["Trap"], "experience": ""},
        {"_id": "c", "fullName": "Cy", "genres": ["Jazz", "Soul"], "featuredTracks": ["Intro"]},
        {"_id": "d", "fullName": "Di", "genres": ["House"], "tools": ["Ableton Live"]},
        {"_id": "e", "fullName": "Ed", "skills": ["Mastering"]}
    ]"#;
    let catalog: Vec<ProducerRecord> = serde_json::from_str(json).unwrap();
    let engine = Recommender::new(EngineConfig::default()).unwrap();
    engine.train(&catalog).unwrap();

    let vocabulary = engine.vocabulary().unwrap();
    assert_eq!(vocabulary.genres(), ["House", "Jazz", "Soul", "Trap"]);
    assert!(vocabulary.experience_levels().is_empty());

    let hits = engine
        .recommend(&RecommendQuery::new().with_genres(["Soul", "Jazz"]))
        .unwrap();
    assert_eq!(hits[0].producer_id, "c");
    assert_eq!(hits[0].matching_genres, vec!["Soul", "Jazz"]);
}

#[test]
fn producer_lookup_by_id_then_name_from_a_catalog_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&studio_catalog()).unwrap().as_bytes())
        .unwrap();
    let source = harmonix::JsonFileCatalog::new(file.path());

    let by_id = harmonix::lookup_producer(&source, "p-2").unwrap().unwrap();
    assert_eq!(by_id.producer.full_name, "Miles Blue");
    assert_eq!(by_id.featured_track_titles, vec!["Miles Blue - Late Set"]);

    let by_name = harmonix::lookup_producer(&source, "dana keys").unwrap().unwrap();
    assert_eq!(by_name.producer.id, "p-1");

    assert!(harmonix::lookup_producer(&source, "p-404").unwrap().is_none());
}
