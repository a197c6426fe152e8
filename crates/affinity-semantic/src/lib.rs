//! Embedding service: model lifecycle, bounded cache, timeouts and fallback.
//!
//! The scoring engine talks to this crate only through
//! [`affinity_core::traits::TextSimilarity`]. Every failure mode here (model
//! missing, failed load, slow inference) surfaces as `None`, which the engine
//! answers with a lexical score.

pub mod cache;
pub mod loader;
pub mod service;
pub mod similarity;

pub use cache::{normalize_text, EmbeddingCache};
pub use loader::{LocalModelLoader, ModelLoader};
pub use service::{EmbeddingService, ModelState};
pub use similarity::cosine_similarity;
