use std::time::Duration;

use async_trait::async_trait;

use crate::types::MatchRecord;

/// A sentence-embedding model. Implementations are blocking and are driven
/// from the blocking thread pool by the embedding service.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Semantic similarity between two free-text answers.
///
/// `None` means the semantic signal is unavailable for this call (model not
/// loaded, failed, or too slow); callers fall back to lexical similarity.
/// Implementations must not panic or return errors.
#[async_trait]
pub trait TextSimilarity: Send + Sync {
    async fn similarity(&self, a: &str, b: &str, timeout: Duration) -> Option<f64>;
}

/// Persistence boundary for match records, owned by the event collaborator.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn exists(&self, user_id: &str, matched_user_id: &str, event_id: &str) -> crate::Result<bool>;
    async fn insert(&self, record: MatchRecord) -> crate::Result<()>;
    async fn list(&self, event_id: &str) -> crate::Result<Vec<MatchRecord>>;
}
