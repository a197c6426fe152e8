use anyhow::Result;

use affinity_core::config::EmbeddingSettings;
use affinity_core::traits::Embedder;
use affinity_embed::load_embedder;

/// Builds the embedding model. Called at most once per service generation,
/// on the blocking pool.
pub trait ModelLoader: Send + Sync + 'static {
    fn load(&self) -> Result<Box<dyn Embedder>>;
}

impl<F> ModelLoader for F
where
    F: Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
{
    fn load(&self) -> Result<Box<dyn Embedder>> { self() }
}

/// Loads the local model (or the hash embedder) described by the settings.
pub struct LocalModelLoader { settings: EmbeddingSettings }

impl LocalModelLoader {
    pub fn new(settings: EmbeddingSettings) -> Self { Self { settings } }
}

impl ModelLoader for LocalModelLoader {
    fn load(&self) -> Result<Box<dyn Embedder>> { load_embedder(&self.settings) }
}
