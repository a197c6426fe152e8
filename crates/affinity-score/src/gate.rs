//! Hard deal-breaker gate. Any failing rule zeroes the pair.
use serde::Serialize;

use affinity_core::{Field, Profile};

use crate::height::parse_height_cm;
use crate::similarity::parse_number;

const NO_PREFERENCE: &[&str] = &["any", "all", "both", "everyone", "anyone", "no preference"];
const NOTHING: &[&str] = &["none", "no", "n/a", "na", "nothing"];

const TALL_MALE_CM: f64 = 175.0;
const TALL_FEMALE_CM: f64 = 170.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResult {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl GateResult {
    pub fn pass() -> Self {
        Self { blocked: false, reason: None }
    }

    pub fn block(reason: String) -> Self {
        Self { blocked: true, reason: Some(reason) }
    }
}

type Rule = fn(&Profile, &Profile) -> Option<String>;

const RULES: [Rule; 4] = [gender_rule, height_rule, age_range_rule, deal_breaker_rule];

/// Evaluate every hard rule in both directions; the first failure wins.
pub fn evaluate_hard_filters(a: &Profile, b: &Profile) -> GateResult {
    for rule in RULES {
        if let Some(reason) = rule(a, b).or_else(|| rule(b, a)) {
            return GateResult::block(reason);
        }
    }
    GateResult::pass()
}

/// Canonical spelling of a gender answer.
pub fn normalize_gender(raw: &str) -> String {
    let g = raw.trim().to_lowercase();
    match g.as_str() {
        "male" | "males" | "man" | "men" | "m" => "male".to_string(),
        "female" | "females" | "woman" | "women" | "f" => "female".to_string(),
        _ => g,
    }
}

fn is_no_preference(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.is_empty() || NO_PREFERENCE.contains(&t.as_str())
}

fn keep_token(token: &str) -> Option<String> {
    let t = token.trim().to_lowercase();
    (!t.is_empty() && !NOTHING.contains(&t.as_str())).then_some(t)
}

/// Comma-separated list items. Phrases such as "drinking and driving" stay whole.
fn comma_tokens(text: &str) -> Vec<String> {
    text.split(',').filter_map(keep_token).collect()
}

/// Partner-gender answers also join choices with "/", "&", "or" and "and".
fn preference_tokens(text: &str) -> Vec<String> {
    text.split([',', '/', '&', ';'])
        .flat_map(|part| part.split(" or ").flat_map(|p| p.split(" and ")))
        .filter_map(keep_token)
        .collect()
}

/// Whether a partner-gender preference admits `gender`.
pub(crate) fn accepts_gender(preference: &str, gender: &str) -> bool {
    let wanted: Vec<String> = preference_tokens(preference).iter().map(|t| normalize_gender(t)).collect();
    if wanted.is_empty() || is_no_preference(preference) || wanted.iter().any(|w| is_no_preference(w)) {
        return true;
    }
    wanted.contains(&normalize_gender(gender))
}

fn gender_rule(seeker: &Profile, other: &Profile) -> Option<String> {
    let preference = seeker.answer(Field::PartnerGender)?;
    let gender = other.answer(Field::Gender)?;
    (!accepts_gender(preference, gender)).then(|| {
        format!("{} is looking for {} partners; {} is {}", seeker.id, preference, other.id, gender)
    })
}

fn height_rule(seeker: &Profile, other: &Profile) -> Option<String> {
    let wants_tall = seeker
        .answer(Field::PhysicalPreference)
        .is_some_and(|p| p.to_lowercase().contains("tall"));
    if !wants_tall {
        return None;
    }
    let threshold = match normalize_gender(other.answer(Field::Gender)?).as_str() {
        "male" => TALL_MALE_CM,
        "female" => TALL_FEMALE_CM,
        _ => return None,
    };
    let height = parse_height_cm(other.answer(Field::Height)?)?;
    (height < threshold).then(|| {
        format!("{} prefers a tall partner; {} is {:.0} cm", seeker.id, other.id, height)
    })
}

/// Accepts `X-Y`, `X–Y`, `X—Y` and `X to Y`. `None` means no constraint.
pub fn parse_age_range(text: &str) -> Option<(f64, f64)> {
    if is_no_preference(text) {
        return None;
    }
    let lowered = text.to_lowercase();
    let (lo, hi) = lowered
        .split_once(['-', '–', '—'])
        .or_else(|| lowered.split_once(" to "))?;
    let (lo, hi) = (parse_number(lo).ok()?, parse_number(hi).ok()?);
    Some((lo.min(hi), lo.max(hi)))
}

fn age_range_rule(seeker: &Profile, other: &Profile) -> Option<String> {
    let (lo, hi) = parse_age_range(seeker.answer(Field::PreferredAgeRange)?)?;
    let age = parse_number(other.answer(Field::Age)?).ok()?;
    (age < lo || age > hi).then(|| {
        format!("{} prefers ages {lo}-{hi}; {} is {age}", seeker.id, other.id)
    })
}

fn deal_breaker_rule(seeker: &Profile, other: &Profile) -> Option<String> {
    let breakers = comma_tokens(seeker.answer(Field::DealBreakers)?);
    let vices = comma_tokens(other.answer(Field::Vices)?);
    breakers.iter().find_map(|d| {
        vices
            .iter()
            .find(|v| d.contains(v.as_str()) || v.contains(d.as_str()))
            .map(|v| format!("{}'s deal-breaker \"{d}\" conflicts with {}'s \"{v}\"", seeker.id, other.id))
    })
}
