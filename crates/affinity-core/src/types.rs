//! Domain types shared by the embedding, scoring and matching crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version of the canonical field schema below. Bump when a field is added,
/// removed or changes meaning.
pub const SCHEMA_VERSION: u32 = 1;

pub type ProfileId = String;

/// Canonical survey fields the scoring engine reads.
///
/// Raw survey question wording never reaches the engine; it is translated to
/// these identifiers at ingestion (see `ingest::SurveySchema`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Hobbies,
    Music,
    Movies,
    Vacation,
    Age,
    Gender,
    PartnerGender,
    Activity,
    PetImportance,
    ChildImportance,
    Height,
    Occupation,
    BucketList,
    Education,
    Vices,
    DealBreakers,
    PhysicalPreference,
    PreferredAgeRange,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Hobbies,
        Field::Music,
        Field::Movies,
        Field::Vacation,
        Field::Age,
        Field::Gender,
        Field::PartnerGender,
        Field::Activity,
        Field::PetImportance,
        Field::ChildImportance,
        Field::Height,
        Field::Occupation,
        Field::BucketList,
        Field::Education,
        Field::Vices,
        Field::DealBreakers,
        Field::PhysicalPreference,
        Field::PreferredAgeRange,
    ];

    /// Canonical key, as used in serialized profiles.
    pub fn key(self) -> &'static str {
        match self {
            Field::Hobbies => "hobbies",
            Field::Music => "music",
            Field::Movies => "movies",
            Field::Vacation => "vacation",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::PartnerGender => "partnerGender",
            Field::Activity => "activity",
            Field::PetImportance => "petImportance",
            Field::ChildImportance => "childImportance",
            Field::Height => "height",
            Field::Occupation => "occupation",
            Field::BucketList => "bucketList",
            Field::Education => "education",
            Field::Vices => "vices",
            Field::DealBreakers => "dealBreakers",
            Field::PhysicalPreference => "physicalPreference",
            Field::PreferredAgeRange => "preferredAgeRange",
        }
    }

    /// Resolve a canonical key in any case, with or without underscores.
    pub fn from_key(key: &str) -> Option<Field> {
        let folded: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        Field::ALL
            .into_iter()
            .find(|f| f.key().to_lowercase() == folded)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A participant's answers keyed by canonical field.
///
/// Profiles are read-only inputs; the engine never mutates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub answers: BTreeMap<Field, String>,
}

impl Profile {
    pub fn new(id: impl Into<ProfileId>) -> Self {
        Self { id: id.into(), answers: BTreeMap::new() }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.answers.insert(field, value.into());
        self
    }

    /// The trimmed answer, or `None` when absent or blank.
    pub fn answer(&self, field: Field) -> Option<&str> {
        self.answers
            .get(&field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn has(&self, field: Field) -> bool {
        self.answer(field).is_some()
    }
}

/// Scored compatibility factors and their weights' keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    DealBreakers,
    GenderPreference,
    AgeCompatibility,
    Personality,
    Hobbies,
    Music,
    Movies,
    Vacation,
    LifeGoals,
    Activity,
    PetFriendliness,
    ChildFriendliness,
    Vices,
    Height,
    Occupation,
    Education,
}

impl Factor {
    pub const ALL: [Factor; 16] = [
        Factor::DealBreakers,
        Factor::GenderPreference,
        Factor::AgeCompatibility,
        Factor::Personality,
        Factor::Hobbies,
        Factor::Music,
        Factor::Movies,
        Factor::Vacation,
        Factor::LifeGoals,
        Factor::Activity,
        Factor::PetFriendliness,
        Factor::ChildFriendliness,
        Factor::Vices,
        Factor::Height,
        Factor::Occupation,
        Factor::Education,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Factor::DealBreakers => "dealBreakers",
            Factor::GenderPreference => "genderPreference",
            Factor::AgeCompatibility => "ageCompatibility",
            Factor::Personality => "personality",
            Factor::Hobbies => "hobbies",
            Factor::Music => "music",
            Factor::Movies => "movies",
            Factor::Vacation => "vacation",
            Factor::LifeGoals => "lifeGoals",
            Factor::Activity => "activity",
            Factor::PetFriendliness => "petFriendliness",
            Factor::ChildFriendliness => "childFriendliness",
            Factor::Vices => "vices",
            Factor::Height => "height",
            Factor::Occupation => "occupation",
            Factor::Education => "education",
        }
    }

    /// Label used in `PairScore::strengths`.
    pub fn strength_label(self) -> &'static str {
        match self {
            Factor::DealBreakers => "No deal-breaker conflicts",
            Factor::GenderPreference => "Mutual gender preferences",
            Factor::AgeCompatibility => "Close in age",
            Factor::Personality => "Compatible personalities",
            Factor::Hobbies => "Shared hobbies",
            Factor::Music => "Similar taste in music",
            Factor::Movies => "Similar taste in movies",
            Factor::Vacation => "Similar vacation style",
            Factor::LifeGoals => "Aligned life goals",
            Factor::Activity => "Matching activity levels",
            Factor::PetFriendliness => "Same view on pets",
            Factor::ChildFriendliness => "Same view on children",
            Factor::Vices => "Similar habits",
            Factor::Height => "Compatible heights",
            Factor::Occupation => "Related occupations",
            Factor::Education => "Similar education",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Five-trait personality estimate, each trait in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityVector {
    pub extroversion: f64,
    pub openness: f64,
    pub conscientiousness: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl Default for PersonalityVector {
    fn default() -> Self {
        Self {
            extroversion: 0.5,
            openness: 0.5,
            conscientiousness: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

/// Result of scoring one ordered pair. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScore {
    pub final_score: f64,
    pub breakdown: BTreeMap<Factor, f64>,
    pub deal_breakers: Vec<String>,
    pub strengths: Vec<String>,
}

impl PairScore {
    /// The score of a pair rejected by the deal-breaker gate.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            final_score: 0.0,
            breakdown: BTreeMap::new(),
            deal_breakers: vec![reason.into()],
            strengths: Vec::new(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.deal_breakers.is_empty()
    }
}

/// Persisted match between a source user and a ranked counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub user_id: ProfileId,
    pub matched_user_id: ProfileId,
    pub event_id: String,
    pub score: f64,
    #[serde(default)]
    pub user_revealed: bool,
    #[serde(default)]
    pub matched_user_revealed: bool,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn new(user_id: &str, matched_user_id: &str, event_id: &str, score: f64) -> Self {
        Self {
            user_id: user_id.to_string(),
            matched_user_id: matched_user_id.to_string(),
            event_id: event_id.to_string(),
            score,
            user_revealed: false,
            matched_user_revealed: false,
            created_at: Utc::now(),
        }
    }

    pub fn same_pair(&self, user_id: &str, matched_user_id: &str, event_id: &str) -> bool {
        self.user_id == user_id && self.matched_user_id == matched_user_id && self.event_id == event_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Operational snapshot of the embedding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub cache_size: usize,
}
