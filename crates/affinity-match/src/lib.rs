//! Cohort ranking and idempotent persistence of top-K matches.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use affinity_core::config::BatchSettings;
use affinity_core::traits::MatchStore;
use affinity_core::{Error, MatchRecord, PairScore, Profile, ProfileId, Result};
use affinity_score::CompatibilityEngine;

mod store;

pub use store::{InMemoryMatchStore, JsonFileMatchStore};

/// A ranked counterpart for one source profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub matched_user_id: ProfileId,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Top-K of this run for every source, whether newly stored or not.
    pub matches: Vec<MatchRecord>,
    pub created: usize,
    pub skipped_existing: usize,
    pub blocked_pairs: usize,
    pub failed_pairs: usize,
}

#[derive(Debug, Default)]
pub struct Ranking {
    pub candidates: BTreeMap<ProfileId, Vec<Candidate>>,
    pub blocked_pairs: usize,
    pub failed_pairs: usize,
}

pub struct BatchMatcher {
    engine: Arc<CompatibilityEngine>,
    store: Arc<dyn MatchStore>,
    concurrency: usize,
}

impl BatchMatcher {
    pub fn new(engine: Arc<CompatibilityEngine>, store: Arc<dyn MatchStore>, settings: &BatchSettings) -> Self {
        Self { engine, store, concurrency: settings.concurrency.max(1) }
    }

    /// Rank the cohort and persist each source's top `k` for `event_id`.
    ///
    /// Pairs already stored for the event are left alone, so re-running the
    /// batch never duplicates records. A pair that fails to score is logged
    /// and skipped; a store failure aborts the run.
    pub async fn run(&self, cohort: &[Profile], k: usize, event_id: &str) -> Result<BatchReport> {
        let ranking = self.rank(cohort, k).await?;
        let mut report = BatchReport {
            blocked_pairs: ranking.blocked_pairs,
            failed_pairs: ranking.failed_pairs,
            ..Default::default()
        };

        for (user_id, candidates) in &ranking.candidates {
            for c in candidates {
                let record = MatchRecord::new(user_id, &c.matched_user_id, event_id, c.score);
                if self.store.exists(user_id, &c.matched_user_id, event_id).await? {
                    debug!(user = %user_id, matched = %c.matched_user_id, "match already stored");
                    report.skipped_existing += 1;
                } else {
                    self.store.insert(record.clone()).await?;
                    report.created += 1;
                }
                report.matches.push(record);
            }
        }

        info!(
            event = event_id,
            cohort = cohort.len(),
            created = report.created,
            skipped = report.skipped_existing,
            blocked = report.blocked_pairs,
            failed = report.failed_pairs,
            "batch matching finished"
        );
        Ok(report)
    }

    /// Score every ordered pair and keep each source's best `k` counterparts,
    /// ordered by descending score, then counterpart id. A cohort that lists
    /// the same id twice is rejected before any scoring.
    pub async fn rank(&self, cohort: &[Profile], k: usize) -> Result<Ranking> {
        let mut seen = BTreeSet::new();
        if let Some(dup) = cohort.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(Error::InvalidProfile(format!("duplicate profile id in cohort: {}", dup.id)));
        }

        let profiles: Vec<Arc<Profile>> = cohort.iter().cloned().map(Arc::new).collect();
        let pairs: Vec<(Arc<Profile>, Arc<Profile>)> = profiles
            .iter()
            .flat_map(|a| profiles.iter().map(move |b| (Arc::clone(a), Arc::clone(b))))
            .filter(|(a, b)| a.id != b.id)
            .collect();
        debug!(pairs = pairs.len(), concurrency = self.concurrency, "scoring cohort");

        let mut results = stream::iter(pairs)
            .map(|(a, b)| {
                let engine = Arc::clone(&self.engine);
                let task = tokio::spawn(async move {
                    let score = engine.compatibility_breakdown(&a, &b).await;
                    (a, b, score)
                });
                async move { task.await }
            })
            .buffer_unordered(self.concurrency);

        let mut ranking = Ranking::default();
        while let Some(joined) = results.next().await {
            match joined {
                Ok((a, _, Ok(score))) if score.is_blocked() => {
                    debug!(user = %a.id, reason = ?score.deal_breakers, "pair blocked");
                    ranking.blocked_pairs += 1;
                }
                Ok((a, b, Ok(PairScore { final_score, .. }))) => {
                    ranking
                        .candidates
                        .entry(a.id.clone())
                        .or_default()
                        .push(Candidate { matched_user_id: b.id.clone(), score: final_score });
                }
                Ok((a, b, Err(e))) => {
                    warn!(user = %a.id, matched = %b.id, error = %e, "pair scoring failed; skipping");
                    ranking.failed_pairs += 1;
                }
                Err(e) => {
                    warn!(error = %e, "pair scoring task panicked; skipping");
                    ranking.failed_pairs += 1;
                }
            }
        }

        for candidates in ranking.candidates.values_mut() {
            candidates.sort_by(|x, y| {
                y.score
                    .partial_cmp(&x.score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| x.matched_user_id.cmp(&y.matched_user_id))
            });
            candidates.truncate(k);
        }
        Ok(ranking)
    }
}
