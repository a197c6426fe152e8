const STEEPNESS: f64 = 10.0;

/// Exaggerate clear signals, then squash around 0.5. Output is in `[0, 1]`.
pub fn shape(raw: f64) -> f64 {
    let adjusted = if raw > 0.85 {
        raw * 1.15
    } else if raw > 0.75 {
        raw * 1.10
    } else if raw > 0.65 {
        raw * 1.05
    } else if raw < 0.25 {
        raw * 0.70
    } else if raw < 0.40 {
        raw * 0.85
    } else {
        raw
    };
    let squashed = 1.0 / (1.0 + (-STEEPNESS * (adjusted - 0.5)).exp());
    squashed.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_fixed() {
        assert!((shape(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shaping_is_monotonic_and_bounded() {
        let mut last = -1.0;
        for i in 0..=100 {
            let s = shape(f64::from(i) / 100.0);
            assert!((0.0..=1.0).contains(&s));
            assert!(s >= last, "not monotonic at {i}");
            last = s;
        }
    }

    fn logistic(x: f64) -> f64 {
        1.0 / (1.0 + (-10.0 * (x - 0.5)).exp())
    }

    #[test]
    fn multipliers_per_band() {
        let cases = [
            (0.2, 0.2 * 0.70),
            (0.3, 0.3 * 0.85),
            (0.5, 0.5),
            (0.7, 0.7 * 1.05),
            (0.8, 0.8 * 1.10),
            (0.9, 0.9 * 1.15),
        ];
        for (raw, adjusted) in cases {
            assert!((shape(raw) - logistic(adjusted)).abs() < 1e-12, "raw {raw}");
        }
        assert!((shape(0.9) - 0.995_274_287_397_604_6).abs() < 1e-12);
    }

    #[test]
    fn band_edges_fall_to_the_lower_band() {
        let cases = [
            (0.85, 0.85 * 1.10),
            (0.75, 0.75 * 1.05),
            (0.65, 0.65),
            (0.40, 0.40),
            (0.25, 0.25 * 0.85),
        ];
        for (raw, adjusted) in cases {
            assert!((shape(raw) - logistic(adjusted)).abs() < 1e-12, "raw {raw}");
        }
    }

    #[test]
    fn strong_scores_are_boosted() {
        assert!(shape(0.9) > 0.99);
        assert!(shape(0.2) < 0.03);
    }
}
