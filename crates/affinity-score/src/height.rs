/// Parse a height answer to centimetres.
///
/// Accepts `"170 - 180 cm"` ranges (midpoint), feet and inches such as
/// `5'10"`, or a bare number of centimetres.
pub fn parse_height_cm(text: &str) -> Option<f64> {
    let s = text.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    if let Some((feet, inches)) = s.split_once('\'') {
        let feet: f64 = feet.trim().parse().ok()?;
        let inches = inches.trim().trim_end_matches('"').trim();
        let inches: f64 = if inches.is_empty() { 0.0 } else { inches.parse().ok()? };
        return Some(feet * 30.48 + inches * 2.54);
    }
    let s = s.trim_end_matches("cm").trim();
    if let Some((lo, hi)) = s.split_once(['-', '–', '—']) {
        let lo: f64 = lo.trim().trim_end_matches("cm").trim().parse().ok()?;
        let hi: f64 = hi.trim().parse().ok()?;
        return Some((lo + hi) / 2.0);
    }
    s.parse::<f64>().ok().filter(|h| h.is_finite() && *h > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_use_the_midpoint() {
        assert_eq!(parse_height_cm("170 - 180 cm"), Some(175.0));
        assert_eq!(parse_height_cm("160–170cm"), Some(165.0));
    }

    #[test]
    fn feet_and_inches_convert() {
        let h = parse_height_cm("5'10\"").unwrap();
        assert!((h - 177.8).abs() < 1e-9);
        assert!((parse_height_cm("6'").unwrap() - 182.88).abs() < 1e-9);
    }

    #[test]
    fn bare_numbers_and_garbage() {
        assert_eq!(parse_height_cm("182"), Some(182.0));
        assert_eq!(parse_height_cm("182 cm"), Some(182.0));
        assert_eq!(parse_height_cm("tall-ish"), None);
        assert_eq!(parse_height_cm(""), None);
    }
}
