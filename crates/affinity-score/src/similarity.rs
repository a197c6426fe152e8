//! Lexical and numeric similarity primitives.
use std::collections::BTreeSet;

use affinity_core::{Error, Result};

/// Share of the hybrid text score taken by the semantic signal.
pub const SEMANTIC_SHARE: f64 = 0.7;

/// Comma-separated answer to a set of trimmed, lowercased, non-empty tokens.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Jaccard index of the two answers' token sets.
///
/// Two empty answers count as identical (1.0); exactly one empty answer
/// shares nothing (0.0).
pub fn jaccard(a: &str, b: &str) -> f64 {
    let (ta, tb) = (tokenize(a), tokenize(b));
    match (ta.is_empty(), tb.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}

/// Sigmoid decay over `|a - b| / max_diff`: mild for small gaps, steep past
/// the tolerance.
pub fn numeric_proximity(a: f64, b: f64, max_diff: f64) -> f64 {
    let normalized = if max_diff > 0.0 { (a - b).abs() / max_diff } else { f64::INFINITY };
    1.0 / (1.0 + (normalized - 0.5).exp())
}

/// Leading number of an answer such as `"29"`, `"3.5"` or `"29 years"`.
pub fn parse_number(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let head = trimmed.split_whitespace().next().unwrap_or_default();
    head.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::InvalidNumericField(trimmed.to_string()))
}

/// Blend of semantic and lexical similarity, in `[0, 1]`. Without a semantic
/// signal the lexical score stands alone.
pub fn hybrid(semantic: Option<f64>, lexical: f64) -> f64 {
    match semantic {
        Some(s) => (SEMANTIC_SHARE * s + (1.0 - SEMANTIC_SHARE) * lexical).clamp(0.0, 1.0),
        None => lexical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_ignore_case_and_blanks() {
        let t = tokenize(" Rock, jazz ,, JAZZ ,");
        assert_eq!(t.into_iter().collect::<Vec<_>>(), vec!["jazz", "rock"]);
    }

    #[test]
    fn proximity_decays_with_distance() {
        let near = numeric_proximity(25.0, 26.0, 10.0);
        let far = numeric_proximity(25.0, 45.0, 10.0);
        assert!(near > far);
        assert!((numeric_proximity(3.0, 3.0, 2.0) - 1.0 / (1.0 + (-0.5f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn numbers_with_units_parse() {
        assert_eq!(parse_number(" 29 years").unwrap(), 29.0);
        assert!(matches!(parse_number("late twenties"), Err(Error::InvalidNumericField(_))));
        assert!(parse_number("").is_err());
    }

    #[test]
    fn hybrid_is_clamped() {
        assert_eq!(hybrid(Some(-1.0), 0.0), 0.0);
        assert!((hybrid(Some(1.0), 0.5) - 0.85).abs() < 1e-12);
        assert_eq!(hybrid(None, 0.25), 0.25);
    }
}
