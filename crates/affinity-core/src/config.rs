//! Layered configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_EMBEDDING__USE_FAKE=true`).
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding callers).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All typed settings; missing sections fall back to their defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract::<Settings>()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub survey: SurveySettings,
    #[serde(default)]
    pub data: DataSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be > 0".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be > 0".into()));
        }
        if self.embedding.breakdown_timeout_ms == 0 || self.embedding.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("embedding timeouts must be > 0".into()));
        }
        if self.batch.concurrency == 0 {
            return Err(Error::InvalidConfig("batch.concurrency must be > 0".into()));
        }
        if self.batch.top_k == 0 {
            return Err(Error::InvalidConfig("batch.top_k must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: String,
    /// Use the deterministic hash embedder instead of loading model weights.
    pub use_fake: bool,
    pub dimension: usize,
    pub max_len: usize,
    /// Maximum number of cached embeddings. The cache never evicts.
    pub cache_size_limit: usize,
    pub breakdown_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            use_fake: false,
            dimension: 384,
            max_len: 128,
            cache_size_limit: 1000,
            breakdown_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub top_k: usize,
    /// Upper bound on pair computations in flight.
    pub concurrency: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { top_k: 3, concurrency: 8 }
    }
}

/// Raw survey question text mapped to canonical field keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveySettings {
    pub questions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub profiles_dir: String,
    pub matches_file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            profiles_dir: "data/profiles".to_string(),
            matches_file: "data/matches.json".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
