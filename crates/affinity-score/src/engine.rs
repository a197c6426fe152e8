use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, trace};

use affinity_core::config::EmbeddingSettings;
use affinity_core::traits::TextSimilarity;
use affinity_core::{Error, Factor, Field, PairScore, Profile, Result};

use crate::aggregate::aggregate;
use crate::gate::{accepts_gender, evaluate_hard_filters};
use crate::height::parse_height_cm;
use crate::personality::{combine_traits, infer_traits};
use crate::shaper::shape;
use crate::similarity::{hybrid, jaccard, numeric_proximity, parse_number};
use crate::weights::{WeightTable, WEIGHTS};

/// Factors blending semantic and lexical similarity of free text.
const TEXT_FACTORS: [(Factor, Field); 5] = [
    (Factor::Hobbies, Field::Hobbies),
    (Factor::Music, Field::Music),
    (Factor::Movies, Field::Movies),
    (Factor::Vacation, Field::Vacation),
    (Factor::LifeGoals, Field::BucketList),
];

/// Scale answers compared numerically when both sides are numbers.
const SCALE_FACTORS: [(Factor, Field); 3] = [
    (Factor::Activity, Field::Activity),
    (Factor::PetFriendliness, Field::PetImportance),
    (Factor::ChildFriendliness, Field::ChildImportance),
];

const SET_FACTORS: [(Factor, Field); 3] = [
    (Factor::Vices, Field::Vices),
    (Factor::Occupation, Field::Occupation),
    (Factor::Education, Field::Education),
];

const AGE_TOLERANCE: f64 = 10.0;
const SCALE_TOLERANCE: f64 = 2.0;
const HEIGHT_TOLERANCE_CM: f64 = 15.0;
const STRENGTH_THRESHOLD: f64 = 0.8;

/// Scores ordered profile pairs.
///
/// Semantic similarity is injected; when it has nothing to offer the text
/// factors fall back to token overlap, so scoring itself never fails on the
/// embedding path.
pub struct CompatibilityEngine {
    text: Arc<dyn TextSimilarity>,
    weights: WeightTable,
    breakdown_timeout: Duration,
    request_timeout: Duration,
}

impl CompatibilityEngine {
    pub fn new(text: Arc<dyn TextSimilarity>, settings: &EmbeddingSettings) -> Self {
        Self {
            text,
            weights: WEIGHTS,
            breakdown_timeout: Duration::from_millis(settings.breakdown_timeout_ms),
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
        }
    }

    /// Final compatibility score in `[0, 1]`.
    pub async fn calculate_compatibility(&self, a: &Profile, b: &Profile) -> Result<f64> {
        Ok(self.score_pair(a, b, self.request_timeout).await?.final_score)
    }

    /// Final score with the per-factor breakdown, gate reasons and strengths.
    pub async fn compatibility_breakdown(&self, a: &Profile, b: &Profile) -> Result<PairScore> {
        self.score_pair(a, b, self.breakdown_timeout).await
    }

    async fn score_pair(&self, a: &Profile, b: &Profile, timeout: Duration) -> Result<PairScore> {
        for p in [a, b] {
            if p.id.trim().is_empty() {
                return Err(Error::InvalidProfile("profile id is empty".into()));
            }
        }

        let gate = evaluate_hard_filters(a, b);
        if gate.blocked {
            let reason = gate.reason.unwrap_or_else(|| "deal-breaker".to_string());
            debug!(a = %a.id, b = %b.id, %reason, "pair blocked");
            return Ok(PairScore::blocked(reason));
        }

        let mut breakdown = local_factors(a, b);
        breakdown.extend(self.text_factors(a, b, timeout).await);

        let agg = aggregate(&breakdown, &self.weights);
        let final_score = agg.raw_score().map(shape).unwrap_or(0.0);
        let strengths = breakdown
            .iter()
            .filter(|(_, s)| **s >= STRENGTH_THRESHOLD)
            .map(|(f, _)| f.strength_label().to_string())
            .collect();
        debug!(
            a = %a.id,
            b = %b.id,
            factors = breakdown.len(),
            total_weight = agg.total_weight,
            final_score,
            "pair scored"
        );
        Ok(PairScore { final_score, breakdown, deal_breakers: Vec::new(), strengths })
    }

    async fn text_factors(&self, a: &Profile, b: &Profile, timeout: Duration) -> Vec<(Factor, f64)> {
        let pending = TEXT_FACTORS.into_iter().filter_map(|(factor, field)| {
            let (ta, tb) = both(a, b, field)?;
            Some(async move {
                let semantic = self.text.similarity(ta, tb, timeout).await;
                if semantic.is_none() {
                    trace!(factor = %factor, "no semantic signal; lexical only");
                }
                (factor, hybrid(semantic, jaccard(ta, tb)))
            })
        });
        join_all(pending).await
    }
}

fn both<'a>(a: &'a Profile, b: &'a Profile, field: Field) -> Option<(&'a str, &'a str)> {
    Some((a.answer(field)?, b.answer(field)?))
}

/// Every factor that needs no embedding. Factors lacking data on either side,
/// or holding unparsable numbers, are left out.
fn local_factors(a: &Profile, b: &Profile) -> BTreeMap<Factor, f64> {
    let mut scores = BTreeMap::new();

    let has_cross = |x: &Profile, y: &Profile| x.has(Field::DealBreakers) && y.has(Field::Vices);
    if has_cross(a, b) || has_cross(b, a) {
        // Reaching here means the gate found no conflict.
        scores.insert(Factor::DealBreakers, 1.0);
    }

    let directions: Vec<f64> = [gender_match(a, b), gender_match(b, a)].into_iter().flatten().collect();
    if !directions.is_empty() {
        scores.insert(Factor::GenderPreference, directions.iter().sum::<f64>() / directions.len() as f64);
    }

    if let Some((x, y)) = both(a, b, Field::Age) {
        insert_numeric(&mut scores, Factor::AgeCompatibility, x, y, AGE_TOLERANCE);
    }

    if a.has(Field::Hobbies) && b.has(Field::Hobbies) {
        scores.insert(Factor::Personality, combine_traits(&infer_traits(a), &infer_traits(b)));
    }

    for (factor, field) in SCALE_FACTORS {
        if let Some((x, y)) = both(a, b, field) {
            match (parse_number(x), parse_number(y)) {
                (Ok(nx), Ok(ny)) => scores.insert(factor, numeric_proximity(nx, ny, SCALE_TOLERANCE)),
                _ => scores.insert(factor, jaccard(x, y)),
            };
        }
    }

    for (factor, field) in SET_FACTORS {
        if let Some((x, y)) = both(a, b, field) {
            scores.insert(factor, jaccard(x, y));
        }
    }

    if let Some((x, y)) = both(a, b, Field::Height) {
        match (parse_height_cm(x), parse_height_cm(y)) {
            (Some(hx), Some(hy)) => {
                scores.insert(Factor::Height, numeric_proximity(hx, hy, HEIGHT_TOLERANCE_CM));
            }
            _ => trace!(a = x, b = y, "unparsable height; factor excluded"),
        }
    }

    scores
}

fn insert_numeric(scores: &mut BTreeMap<Factor, f64>, factor: Factor, x: &str, y: &str, tolerance: f64) {
    match (parse_number(x), parse_number(y)) {
        (Ok(nx), Ok(ny)) => {
            scores.insert(factor, numeric_proximity(nx, ny, tolerance));
        }
        (Err(e), _) | (_, Err(e)) => trace!(factor = %factor, error = %e, "factor excluded"),
    }
}

/// 1.0 when `other`'s gender is acceptable to `seeker`. `None` when either
/// answer is missing.
fn gender_match(seeker: &Profile, other: &Profile) -> Option<f64> {
    let preference = seeker.answer(Field::PartnerGender)?;
    let gender = other.answer(Field::Gender)?;
    Some(if accepts_gender(preference, gender) { 1.0 } else { 0.0 })
}
