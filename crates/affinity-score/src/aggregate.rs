use std::collections::BTreeMap;

use affinity_core::Factor;

use crate::weights::WeightTable;

/// Weighted sums over the factors both profiles could be compared on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total_score: f64,
    pub total_weight: f64,
}

impl Aggregate {
    /// Weighted mean, or `None` when no factor was comparable.
    pub fn raw_score(&self) -> Option<f64> {
        (self.total_weight > 0.0).then(|| self.total_score / self.total_weight)
    }
}

/// Factors absent from `scores` are excluded from both sums, never defaulted.
pub fn aggregate(scores: &BTreeMap<Factor, f64>, weights: &WeightTable) -> Aggregate {
    scores.iter().fold(Aggregate { total_score: 0.0, total_weight: 0.0 }, |acc, (factor, score)| {
        let w = weights.get(*factor);
        Aggregate { total_score: acc.total_score + score * w, total_weight: acc.total_weight + w }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::WEIGHTS;

    #[test]
    fn missing_factors_do_not_dilute() {
        let scores = BTreeMap::from([(Factor::Music, 1.0), (Factor::Hobbies, 0.5)]);
        let agg = aggregate(&scores, &WEIGHTS);
        assert!((agg.total_weight - 3.8).abs() < 1e-12);
        assert!((agg.raw_score().unwrap() - (1.8 + 1.0) / 3.8).abs() < 1e-12);
    }

    #[test]
    fn empty_scores_have_no_signal() {
        assert_eq!(aggregate(&BTreeMap::new(), &WEIGHTS).raw_score(), None);
    }
}
