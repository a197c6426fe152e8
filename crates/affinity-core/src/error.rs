use thiserror::Error;

/// Failure taxonomy shared by the scoring crates.
///
/// Only `InvalidProfile`, `InvalidConfig` and `Store` ever reach a caller of the
/// public scoring API. The rest are produced internally and turned into a
/// cheaper fallback (`ModelUnavailable`, `CalculationTimeout`) or into an
/// excluded factor (`MissingProfileData`, `InvalidNumericField`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Calculation timed out after {timeout_ms}ms")]
    CalculationTimeout { timeout_ms: u64 },

    #[error("Missing profile data: {0}")]
    MissingProfileData(String),

    #[error("Invalid numeric field: {0:?}")]
    InvalidNumericField(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Match store failure: {0}")]
    Store(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// True for the errors that route to the Jaccard-only fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Error::ModelUnavailable(_) | Error::CalculationTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
