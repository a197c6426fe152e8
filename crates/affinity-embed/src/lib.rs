//! Local sentence embeddings for free-text survey answers.
//!
//! `SentenceEmbedder` runs a BERT-family encoder (e.g. all-MiniLM-L6-v2,
//! 384 dims) through candle with masked mean pooling. `HashEmbedder` is a
//! weight-free deterministic stand-in selected by `embedding.use_fake`.
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use affinity_core::config::{expand_path, EmbeddingSettings};
use affinity_core::traits::Embedder;

mod device;
mod fake;
mod pool;
mod tokenize;

pub use device::select_device;
pub use fake::HashEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = tokenizer.get_padding().map(|p| p.pad_id).unwrap_or(0);

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        info!(dim, max_len, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, pad_id })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            return Err(anyhow!("Expected embedding dimension {}, got {}", self.dim, emb.len()));
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            debug!(?elapsed, text_len = text.len(), "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: std::collections::HashMap<String, candle_core::Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

/// Build the embedder described by `settings`.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake {
        info!(dim = settings.dimension, "using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(settings.dimension)));
    }
    let model_dir = resolve_model_dir(&settings.model_dir)?;
    let embedder = SentenceEmbedder::load(&model_dir, settings.max_len)?;
    if embedder.dim() != settings.dimension {
        warn!(configured = settings.dimension, actual = embedder.dim(), "model dimension differs from configuration");
    }
    Ok(Box::new(embedder))
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    let p = expand_path(configured);
    if p.exists() { return Ok(p); }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() { debug!(dir = %p.display(), "using MODEL_DIR"); return Ok(p); }
    }
    Err(anyhow!("Could not locate embedding model directory. Checked {} and MODEL_DIR", configured))
}
