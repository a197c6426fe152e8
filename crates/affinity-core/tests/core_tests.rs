use std::fs;

use figment::{providers::{Format, Toml}, Figment};
use tempfile::TempDir;

use affinity_core::config::{Config, SurveySettings};
use affinity_core::ingest::SurveySchema;
use affinity_core::{Field, Profile};

#[test]
fn canonical_keys_resolve_in_any_case() {
    assert_eq!(Field::from_key("partnerGender"), Some(Field::PartnerGender));
    assert_eq!(Field::from_key("partner_gender"), Some(Field::PartnerGender));
    assert_eq!(Field::from_key("DEAL_BREAKERS"), Some(Field::DealBreakers));
    assert_eq!(Field::from_key("favourite colour"), None);
}

#[test]
fn blank_answers_count_as_missing() {
    let p = Profile::new("a").with(Field::Hobbies, "   ").with(Field::Age, " 31 ");
    assert_eq!(p.answer(Field::Hobbies), None);
    assert_eq!(p.answer(Field::Age), Some("31"));
    assert!(!p.has(Field::Music));
}

#[test]
fn load_dir_translates_questions_and_flattens_arrays() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("cohort")).unwrap();
    fs::write(
        dir.join("cohort/a.json"),
        r#"{"id": "u1", "answers": {
            "What do you do for fun?": ["hiking", "board games"],
            "age": 29,
            "Shoe size": "42"
        }}"#,
    )
    .unwrap();
    fs::write(
        dir.join("b.json"),
        r#"[{"id": "u2", "answers": {"gender": "Female", "music": null}},
            {"id": "u3", "answers": {}}]"#,
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let schema = SurveySchema::new().with_question("What do you do for  fun?", Field::Hobbies);
    let profiles = schema.load_dir(dir).expect("load");

    let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["u2", "u3", "u1"], "files are read in path order");

    let u1 = &profiles[2];
    assert_eq!(u1.answer(Field::Hobbies), Some("hiking, board games"));
    assert_eq!(u1.answer(Field::Age), Some("29"));
    assert_eq!(u1.answers.len(), 2, "unmapped questions are dropped");
    assert!(!profiles[0].has(Field::Music));
}

#[test]
fn settings_fall_back_to_defaults_and_accept_overrides() {
    let config = Config::from_figment(Figment::new().merge(Toml::string(
        r#"
        [embedding]
        use_fake = true
        cache_size_limit = 16

        [batch]
        top_k = 5

        [survey.questions]
        "Describe your ideal vacation" = "vacation"
        "#,
    )));
    let settings = config.settings().expect("settings");
    assert!(settings.embedding.use_fake);
    assert_eq!(settings.embedding.cache_size_limit, 16);
    assert_eq!(settings.embedding.dimension, 384);
    assert_eq!(settings.embedding.breakdown_timeout_ms, 5_000);
    assert_eq!(settings.batch.top_k, 5);
    assert_eq!(settings.batch.concurrency, 8);
    settings.validate().expect("valid");

    let schema = SurveySchema::from_settings(&settings.survey).expect("schema");
    assert_eq!(schema.resolve("describe your ideal   VACATION"), Some(Field::Vacation));
    assert_eq!(config.get::<usize>("batch.top_k").unwrap(), 5);
}

#[test]
fn survey_mapping_to_unknown_field_is_rejected() {
    let mut settings = SurveySettings::default();
    settings.questions.insert("Star sign".into(), "zodiac".into());
    assert!(SurveySchema::from_settings(&settings).is_err());
}
