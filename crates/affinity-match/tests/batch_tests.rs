use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use affinity_core::config::{BatchSettings, EmbeddingSettings};
use affinity_core::traits::{MatchStore, TextSimilarity};
use affinity_core::{Error, Field, MatchRecord, Profile};
use affinity_match::{BatchMatcher, InMemoryMatchStore, JsonFileMatchStore};
use affinity_score::CompatibilityEngine;
use affinity_semantic::EmbeddingService;

fn embedding() -> EmbeddingSettings {
    EmbeddingSettings { use_fake: true, dimension: 32, ..Default::default() }
}

fn engine() -> Arc<CompatibilityEngine> {
    let service = Arc::new(EmbeddingService::from_settings(&embedding()));
    Arc::new(CompatibilityEngine::new(service, &embedding()))
}

fn matcher(engine: Arc<CompatibilityEngine>, store: Arc<dyn MatchStore>) -> BatchMatcher {
    BatchMatcher::new(engine, store, &BatchSettings { top_k: 3, concurrency: 4 })
}

/// Age gaps are distinct for every source, so no ranking has ties.
fn cohort() -> Vec<Profile> {
    [("p1", "20"), ("p2", "21"), ("p3", "24"), ("p4", "30"), ("p5", "38")]
        .into_iter()
        .map(|(id, age)| Profile::new(id).with(Field::Age, age).with(Field::Hobbies, "hiking, jazz"))
        .collect()
}

struct Panicky;

#[async_trait]
impl TextSimilarity for Panicky {
    async fn similarity(&self, a: &str, b: &str, _timeout: Duration) -> Option<f64> {
        if a.contains("boom") || b.contains("boom") {
            panic!("similarity backend exploded");
        }
        Some(1.0)
    }
}

struct BrokenStore;

#[async_trait]
impl MatchStore for BrokenStore {
    async fn exists(&self, _: &str, _: &str, _: &str) -> affinity_core::Result<bool> {
        Err(Error::Store("connection refused".into()))
    }
    async fn insert(&self, _: MatchRecord) -> affinity_core::Result<()> {
        Err(Error::Store("connection refused".into()))
    }
    async fn list(&self, _: &str) -> affinity_core::Result<Vec<MatchRecord>> {
        Ok(vec![])
    }
}

fn per_source(records: &[MatchRecord], user: &str) -> Vec<MatchRecord> {
    records.iter().filter(|r| r.user_id == user).cloned().collect()
}

#[tokio::test]
async fn keeps_top_k_per_source_in_descending_order() {
    let store = Arc::new(InMemoryMatchStore::new());
    let m = matcher(engine(), store.clone());
    let people = cohort();

    for k in [3, 10] {
        let report = m.run(&people, k, &format!("event-{k}")).await.unwrap();
        for p in &people {
            let mine = per_source(&report.matches, &p.id);
            assert_eq!(mine.len(), k.min(4), "{} with k={k}", p.id);
            assert!(mine.windows(2).all(|w| w[0].score > w[1].score), "{mine:?}");
            assert!(mine.iter().all(|r| r.matched_user_id != p.id));
        }
    }

    let report = m.run(&people, 3, "event-3b").await.unwrap();
    let p1: Vec<String> = per_source(&report.matches, "p1").into_iter().map(|r| r.matched_user_id).collect();
    assert_eq!(p1, vec!["p2", "p3", "p4"]);
}

#[tokio::test]
async fn repeated_runs_do_not_duplicate_records() {
    let store = Arc::new(InMemoryMatchStore::new());
    let m = matcher(engine(), store.clone());
    let people = cohort();

    let first = m.run(&people, 3, "e1").await.unwrap();
    assert_eq!(first.created, 15);
    assert_eq!(first.skipped_existing, 0);

    let second = m.run(&people, 3, "e1").await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped_existing, 15);
    assert_eq!(second.matches.len(), 15);

    let stored = store.list("e1").await.unwrap();
    assert_eq!(stored.len(), 15);
    let unique: HashSet<(String, String)> =
        stored.iter().map(|r| (r.user_id.clone(), r.matched_user_id.clone())).collect();
    assert_eq!(unique.len(), stored.len());
}

#[tokio::test]
async fn ties_break_on_counterpart_id() {
    let m = matcher(engine(), Arc::new(InMemoryMatchStore::new()));
    let people: Vec<Profile> = ["c", "a", "d", "b"].iter().map(|id| Profile::new(*id).with(Field::Age, "30")).collect();
    let ranking = m.rank(&people, 2).await.unwrap();
    let ids: Vec<&str> = ranking.candidates["d"].iter().map(|c| c.matched_user_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn duplicate_ids_are_rejected_before_scoring() {
    let store = Arc::new(InMemoryMatchStore::new());
    let m = matcher(engine(), store.clone());
    let mut people = cohort();
    people.push(Profile::new("p2").with(Field::Age, "45").with(Field::Hobbies, "chess"));

    assert!(matches!(m.rank(&people, 3).await, Err(Error::InvalidProfile(_))));
    assert!(matches!(m.run(&people, 3, "e").await, Err(Error::InvalidProfile(_))));
    assert!(store.list("e").await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_pairs_are_skipped() {
    let m = matcher(engine(), Arc::new(InMemoryMatchStore::new()));
    let mut people = cohort();
    people.truncate(4);
    people.push(Profile::new("").with(Field::Age, "22"));

    let report = m.run(&people, 3, "e").await.unwrap();
    assert_eq!(report.failed_pairs, 8);
    assert_eq!(report.matches.len(), 12);
    assert!(report.matches.iter().all(|r| !r.user_id.is_empty() && !r.matched_user_id.is_empty()));
}

#[tokio::test]
async fn panicking_pairs_are_skipped() {
    let engine = Arc::new(CompatibilityEngine::new(Arc::new(Panicky), &embedding()));
    let m = matcher(engine, Arc::new(InMemoryMatchStore::new()));
    let mut people = cohort();
    people[4] = Profile::new("p5").with(Field::Hobbies, "boom");

    let report = m.run(&people, 3, "e").await.unwrap();
    assert_eq!(report.failed_pairs, 8);
    assert!(per_source(&report.matches, "p5").is_empty());
    assert_eq!(per_source(&report.matches, "p1").len(), 3);
}

#[tokio::test]
async fn blocked_pairs_are_not_candidates() {
    let m = matcher(engine(), Arc::new(InMemoryMatchStore::new()));
    let people = vec![
        Profile::new("a").with(Field::Gender, "male").with(Field::PartnerGender, "female").with(Field::Age, "30"),
        Profile::new("b").with(Field::Gender, "male").with(Field::Age, "31"),
        Profile::new("c").with(Field::Gender, "female").with(Field::Age, "29"),
    ];
    let report = m.run(&people, 3, "e").await.unwrap();
    assert_eq!(report.blocked_pairs, 2);
    let a: Vec<String> = per_source(&report.matches, "a").into_iter().map(|r| r.matched_user_id).collect();
    assert_eq!(a, vec!["c"]);
    assert_eq!(per_source(&report.matches, "b").len(), 1);
}

#[tokio::test]
async fn store_failures_abort_the_run() {
    let m = matcher(engine(), Arc::new(BrokenStore));
    let err = m.run(&cohort(), 3, "e").await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn json_store_persists_across_instances() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/matches.json");

    let first = JsonFileMatchStore::new(&path);
    assert!(first.list("e").await.unwrap().is_empty());
    let report = matcher(engine(), Arc::new(first)).run(&cohort(), 2, "e").await.unwrap();
    assert_eq!(report.created, 10);

    let reopened = Arc::new(JsonFileMatchStore::new(&path));
    assert_eq!(reopened.list("e").await.unwrap().len(), 10);
    assert!(reopened.list("other").await.unwrap().is_empty());
    assert!(reopened.exists("p1", "p2", "e").await.unwrap());

    let again = matcher(engine(), reopened.clone()).run(&cohort(), 2, "e").await.unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(reopened.list("e").await.unwrap().len(), 10);
}
