//! Profile ingestion: translate raw survey records into canonical profiles.
//!
//! Raw records carry answers keyed by whatever the survey front-end used,
//! usually the literal question text. `SurveySchema` owns the mapping to
//! [`Field`] so the scoring crates only ever see canonical identifiers.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::SurveySettings;
use crate::types::{Field, Profile};

/// A profile as exported by the survey collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    pub id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SurveySchema {
    questions: HashMap<String, Field>,
}

impl SurveySchema {
    /// Schema that only understands canonical keys.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &SurveySettings) -> crate::Result<Self> {
        let mut schema = Self::new();
        for (question, key) in &settings.questions {
            let field = Field::from_key(key).ok_or_else(|| {
                crate::Error::InvalidConfig(format!("survey question {question:?} maps to unknown field {key:?}"))
            })?;
            schema = schema.with_question(question, field);
        }
        Ok(schema)
    }

    pub fn with_question(mut self, question: &str, field: Field) -> Self {
        self.questions.insert(normalize_question(question), field);
        self
    }

    pub fn resolve(&self, raw_key: &str) -> Option<Field> {
        Field::from_key(raw_key).or_else(|| self.questions.get(&normalize_question(raw_key)).copied())
    }

    pub fn translate(&self, raw: &RawProfile) -> Profile {
        let mut profile = Profile::new(raw.id.trim());
        for (key, value) in &raw.answers {
            let Some(field) = self.resolve(key) else {
                debug!(profile_id = %raw.id, question = %key, "dropping unmapped survey question");
                continue;
            };
            if let Some(text) = answer_text(value) {
                profile.answers.insert(field, text);
            }
        }
        profile
    }

    /// Load every `*.json` file under `root`; each holds one raw profile or an array.
    pub fn load_dir(&self, root: &Path) -> Result<Vec<Profile>> {
        let files = list_json_files(root);
        if files.is_empty() {
            warn!(dir = %root.display(), "no profile files found");
            return Ok(vec![]);
        }
        let mut profiles = Vec::new();
        for path in &files {
            let raws = read_raw_profiles(path)?;
            profiles.extend(raws.iter().map(|r| self.translate(r)));
        }
        info!(files = files.len(), profiles = profiles.len(), "loaded profiles");
        Ok(profiles)
    }
}

fn normalize_question(q: &str) -> String {
    q.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Survey answers arrive as strings, numbers or multi-select arrays.
/// Arrays are flattened into the comma-delimited form the engine expects.
fn answer_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(answer_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn read_raw_profiles(path: &Path) -> Result<Vec<RawProfile>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    let raws = if value.is_array() {
        serde_json::from_value::<Vec<RawProfile>>(value)
    } else {
        serde_json::from_value::<RawProfile>(value).map(|r| vec![r])
    };
    raws.with_context(|| format!("decoding profiles in {}", path.display()))
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
