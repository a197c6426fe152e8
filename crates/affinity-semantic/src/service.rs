use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use affinity_core::config::EmbeddingSettings;
use affinity_core::traits::{Embedder, TextSimilarity};
use affinity_core::{Error, HealthReport, HealthStatus};

use crate::cache::{normalize_text, EmbeddingCache};
use crate::loader::{LocalModelLoader, ModelLoader};
use crate::similarity::cosine_similarity;

type LoadOutcome = Result<Arc<dyn Embedder>, String>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// One model generation. `shutdown` and `retry_load` swap in a fresh slot;
/// loads still running against an old slot finish without effect.
#[derive(Default)]
struct ModelSlot {
    load: Mutex<Option<SharedLoad>>,
}

/// Owns the embedding model and its cache.
///
/// Construct once at process start and share through `Arc`. The model is
/// loaded lazily on the first embedding request (or eagerly via
/// [`warm_up`](Self::warm_up)); concurrent first callers await the same load.
/// A failed load is sticky until [`retry_load`](Self::retry_load), and every
/// call made meanwhile degrades to the lexical fallback.
pub struct EmbeddingService {
    loader: Arc<dyn ModelLoader>,
    slot: RwLock<Arc<ModelSlot>>,
    cache: EmbeddingCache,
}

impl EmbeddingService {
    pub fn new<L: ModelLoader>(settings: &EmbeddingSettings, loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            slot: RwLock::new(Arc::new(ModelSlot::default())),
            cache: EmbeddingCache::new(settings.cache_size_limit),
        }
    }

    /// Service backed by the local model (or hash embedder) from `settings`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(settings, LocalModelLoader::new(settings.clone()))
    }

    pub fn state(&self) -> ModelState {
        let Ok(slot) = self.slot.read() else { return ModelState::Failed };
        let Ok(load) = slot.load.lock() else { return ModelState::Failed };
        match load.as_ref().map(|l| l.peek()) {
            None => ModelState::Unloaded,
            Some(None) => ModelState::Loading,
            Some(Some(Ok(_))) => ModelState::Loaded,
            Some(Some(Err(_))) => ModelState::Failed,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len().unwrap_or(0)
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Load the model now instead of on first use.
    pub async fn warm_up(&self) -> ModelState {
        if let Err(e) = self.model().await {
            debug!(error = %e, "warm-up did not produce a model");
        }
        self.state()
    }

    /// Leave the `Failed` state so the next request attempts a fresh load.
    /// Returns false (and does nothing) in any other state.
    pub fn retry_load(&self) -> bool {
        if self.state() != ModelState::Failed {
            return false;
        }
        self.reset_slot();
        info!("embedding model reset for retry");
        true
    }

    /// Drop the model and the cache. The service stays usable and reloads on
    /// the next request.
    pub fn shutdown(&self) {
        self.reset_slot();
        self.cache.clear();
        info!("embedding service shut down");
    }

    pub fn health_check(&self) -> HealthReport {
        match self.probe() {
            Ok((model_loaded, cache_size)) => HealthReport {
                status: if model_loaded { HealthStatus::Healthy } else { HealthStatus::Degraded },
                model_loaded,
                cache_size,
            },
            Err(e) => {
                warn!(error = %e, "embedding health probe failed");
                HealthReport { status: HealthStatus::Unhealthy, model_loaded: false, cache_size: 0 }
            }
        }
    }

    /// Embed `text`, consulting the cache first. The whole call, including
    /// any wait on the initial model load, is bounded by `timeout`; a result
    /// arriving after the deadline is discarded. A result computed across a
    /// `shutdown` or `retry_load` is returned but not cached.
    pub async fn embed(&self, text: &str, timeout: Duration) -> Result<Arc<Vec<f32>>, Error> {
        let key = normalize_text(text);
        if key.is_empty() {
            return Err(Error::MissingProfileData("empty text".into()));
        }
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let generation = self
            .slot
            .read()
            .map(|slot| Arc::clone(&*slot))
            .map_err(|_| Error::Operation("model slot lock poisoned".into()))?;

        let work = async {
            let model = self.model().await?;
            let input = vec![key.clone()];
            let vectors = tokio::task::spawn_blocking(move || model.embed_batch(&input))
                .await
                .map_err(|e| Error::Operation(format!("embedding task failed: {e}")))?
                .map_err(|e| Error::Operation(e.to_string()))?;
            vectors
                .into_iter()
                .next()
                .ok_or_else(|| Error::Operation("embedder returned no vectors".into()))
        };
        let vector: Vec<f32> = tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| Error::CalculationTimeout { timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX) })??;

        let vector = Arc::new(vector);
        self.cache_if_current(&generation, key, &vector);
        Ok(vector)
    }

    /// The read guard is held across the insert so a concurrent reset either
    /// clears the entry afterwards or is seen here.
    fn cache_if_current(&self, generation: &Arc<ModelSlot>, key: String, vector: &Arc<Vec<f32>>) {
        let Ok(slot) = self.slot.read() else { return };
        if Arc::ptr_eq(&*slot, generation) {
            self.cache.insert(key, Arc::clone(vector));
        } else {
            debug!("model reset while embedding; result not cached");
        }
    }

    async fn model(&self) -> Result<Arc<dyn Embedder>, Error> {
        let load = self
            .begin_load()
            .ok_or_else(|| Error::ModelUnavailable("model slot lock poisoned".into()))?;
        load.await.map_err(Error::ModelUnavailable)
    }

    fn begin_load(&self) -> Option<SharedLoad> {
        let slot = Arc::clone(&*self.slot.read().ok()?);
        let mut guard = slot.load.lock().ok()?;
        if let Some(existing) = guard.as_ref() {
            return Some(existing.clone());
        }

        let loader = Arc::clone(&self.loader);
        let load = async move {
            let started = Instant::now();
            match tokio::task::spawn_blocking(move || loader.load()).await {
                Ok(Ok(embedder)) => {
                    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    info!(dim = embedder.dim(), elapsed_ms, "embedding model loaded");
                    let model: Arc<dyn Embedder> = Arc::from(embedder);
                    Ok(model)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "embedding model failed to load; semantic similarity disabled");
                    Err(e.to_string())
                }
                Err(e) => {
                    warn!(error = %e, "embedding model loader panicked; semantic similarity disabled");
                    Err(e.to_string())
                }
            }
        }
        .boxed()
        .shared();

        // Drive the load to completion even if every waiter times out.
        tokio::spawn(load.clone());
        *guard = Some(load.clone());
        Some(load)
    }

    fn reset_slot(&self) {
        let fresh = Arc::new(ModelSlot::default());
        match self.slot.write() {
            Ok(mut slot) => *slot = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }

    fn probe(&self) -> Result<(bool, usize), Error> {
        let cache_size = self
            .cache
            .len()
            .ok_or_else(|| Error::Operation("embedding cache lock poisoned".into()))?;
        let slot = self
            .slot
            .read()
            .map_err(|_| Error::Operation("model slot lock poisoned".into()))?;
        let load = slot
            .load
            .lock()
            .map_err(|_| Error::Operation("model load lock poisoned".into()))?;
        let model_loaded = matches!(load.as_ref().and_then(|l| l.peek()), Some(Ok(_)));
        Ok((model_loaded, cache_size))
    }
}

#[async_trait]
impl TextSimilarity for EmbeddingService {
    async fn similarity(&self, a: &str, b: &str, timeout: Duration) -> Option<f64> {
        let (ea, eb) = tokio::join!(self.embed(a, timeout), self.embed(b, timeout));
        match (ea, eb) {
            (Ok(x), Ok(y)) => Some(cosine_similarity(&x, &y)),
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, fallback = e.is_fallback(), "semantic similarity unavailable; using lexical score");
                None
            }
        }
    }
}
