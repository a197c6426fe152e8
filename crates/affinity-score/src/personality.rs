//! Keyword heuristic mapping hobby text to a five-trait personality estimate.
use affinity_core::{Field, PersonalityVector, Profile};

#[derive(Debug, Clone, Copy)]
enum Trait {
    Extroversion,
    Openness,
    Conscientiousness,
    Agreeableness,
    Neuroticism,
}

struct Nudge {
    keywords: &'static [&'static str],
    target: Trait,
    delta: f64,
}

/// Each group applies at most once, whatever the number of matching keywords.
const NUDGES: &[Nudge] = &[
    Nudge { keywords: &["socializing", "partying", "team sports", "dancing"], target: Trait::Extroversion, delta: 0.3 },
    Nudge { keywords: &["reading", "gaming", "cooking", "art"], target: Trait::Extroversion, delta: -0.2 },
    Nudge { keywords: &["travel", "art", "music", "photography", "writing", "languages"], target: Trait::Openness, delta: 0.3 },
    Nudge { keywords: &["fitness", "gym", "running", "volunteering", "planning"], target: Trait::Conscientiousness, delta: 0.2 },
    Nudge { keywords: &["volunteering", "cooking", "pets", "animals", "gardening"], target: Trait::Agreeableness, delta: 0.2 },
    Nudge { keywords: &["meditation", "yoga", "hiking", "nature"], target: Trait::Neuroticism, delta: -0.2 },
];

/// Personality estimate from the hobbies answer. Profiles without hobbies are
/// neutral on every trait.
pub fn infer_traits(profile: &Profile) -> PersonalityVector {
    let mut traits = PersonalityVector::default();
    let Some(hobbies) = profile.answer(Field::Hobbies) else { return traits };
    let hobbies = hobbies.to_lowercase();

    for nudge in NUDGES {
        if nudge.keywords.iter().any(|k| mentions(&hobbies, k)) {
            let value = trait_mut(&mut traits, nudge.target);
            *value = (*value + nudge.delta).clamp(0.0, 1.0);
        }
    }
    traits
}

/// `keyword` occurs at the start of a word, so "travel" matches "traveling"
/// but "art" does not match "partying".
fn mentions(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(i, _)| {
        !text[..i].chars().next_back().is_some_and(char::is_alphabetic)
    })
}

fn trait_mut(traits: &mut PersonalityVector, target: Trait) -> &mut f64 {
    match target {
        Trait::Extroversion => &mut traits.extroversion,
        Trait::Openness => &mut traits.openness,
        Trait::Conscientiousness => &mut traits.conscientiousness,
        Trait::Agreeableness => &mut traits.agreeableness,
        Trait::Neuroticism => &mut traits.neuroticism,
    }
}

/// Pairwise personality fit in `[0, 1]`.
///
/// Extroversion and openness reward similarity, neuroticism rewards the
/// calmer partner pairing, and conscientiousness and agreeableness reward
/// moderate similarity.
pub fn combine_traits(a: &PersonalityVector, b: &PersonalityVector) -> f64 {
    let similar = |x: f64, y: f64| 1.0 - (x - y).abs();
    let moderate = |x: f64, y: f64| {
        let d = (x - y).abs();
        1.0 - d.min(1.0 - d)
    };
    let scores = [
        similar(a.extroversion, b.extroversion),
        similar(a.openness, b.openness),
        moderate(a.conscientiousness, b.conscientiousness),
        moderate(a.agreeableness, b.agreeableness),
        1.0 - a.neuroticism.max(b.neuroticism),
    ];
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hobbies(text: &str) -> Profile {
        Profile::new("p").with(Field::Hobbies, text)
    }

    #[test]
    fn social_hobbies_raise_extroversion() {
        let t = infer_traits(&hobbies("Dancing, team sports, socializing"));
        assert!((t.extroversion - 0.8).abs() < 1e-12);
        assert_eq!(t.openness, 0.5);
    }

    #[test]
    fn quiet_hobbies_lower_extroversion() {
        let t = infer_traits(&hobbies("reading, gaming"));
        assert!((t.extroversion - 0.3).abs() < 1e-12);
    }

    #[test]
    fn keywords_match_at_word_starts() {
        let t = infer_traits(&hobbies("partying, martial training"));
        assert!((t.extroversion - 0.8).abs() < 1e-12);
        assert_eq!(t.openness, 0.5);
        assert!(infer_traits(&hobbies("Traveling")).openness > 0.5);
    }

    #[test]
    fn missing_hobbies_are_neutral() {
        assert_eq!(infer_traits(&Profile::new("p")), PersonalityVector::default());
    }

    #[test]
    fn inference_is_deterministic() {
        let p = hobbies("yoga, travel, cooking, volunteering");
        assert_eq!(infer_traits(&p), infer_traits(&p));
    }

    fn with(f: impl FnOnce(&mut PersonalityVector)) -> PersonalityVector {
        let mut v = PersonalityVector::default();
        f(&mut v);
        v
    }

    #[test]
    fn moderate_traits_score_one_minus_the_shorter_gap() {
        let a = with(|v| {
            v.conscientiousness = 0.1;
            v.agreeableness = 0.1;
            v.neuroticism = 0.0;
        });
        let b = with(|v| {
            v.conscientiousness = 0.9;
            v.agreeableness = 0.9;
            v.neuroticism = 0.0;
        });
        // |Δ| = 0.8 scores 1 - min(0.8, 0.2) = 0.8 on both moderate traits.
        assert!((combine_traits(&a, &b) - (1.0 + 1.0 + 0.8 + 0.8 + 1.0) / 5.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_and_calm_traits_use_their_own_rules() {
        let a = with(|v| {
            v.extroversion = 0.2;
            v.neuroticism = 0.2;
        });
        let b = with(|v| {
            v.extroversion = 0.8;
            v.neuroticism = 0.6;
        });
        // extroversion 1 - 0.6, neuroticism 1 - max(0.2, 0.6)
        let expected = (0.4 + 1.0 + 1.0 + 1.0 + 0.4) / 5.0;
        assert!((combine_traits(&a, &b) - expected).abs() < 1e-12);
        assert!((combine_traits(&b, &a) - expected).abs() < 1e-12);
    }

    #[test]
    fn combined_score_stays_in_range() {
        let lo = PersonalityVector { extroversion: 0.0, openness: 0.0, conscientiousness: 0.0, agreeableness: 0.0, neuroticism: 1.0 };
        let hi = PersonalityVector { extroversion: 1.0, openness: 1.0, conscientiousness: 1.0, agreeableness: 1.0, neuroticism: 0.0 };
        let s = combine_traits(&lo, &hi);
        assert!((0.0..=1.0).contains(&s));
        let neutral = PersonalityVector::default();
        assert!((combine_traits(&neutral, &neutral) - 0.9).abs() < 1e-12);
    }
}
