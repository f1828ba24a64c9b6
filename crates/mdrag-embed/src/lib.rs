//! Embedding providers behind the core `Embedder` trait.
//!
//! - `openai`: any OpenAI-compatible `/embeddings` endpoint
//! - `hashing`: deterministic feature hashing, no network (tests, offline runs)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use mdrag_core::traits::Embedder;

pub mod hashing;
pub mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Hashing,
}

/// `[embedding]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimension: 1536,
            timeout_secs: 30,
            max_batch_size: 2048,
        }
    }
}

/// Build the configured embedder. `api_key` is only required by remote providers.
pub fn embedder_from_settings(settings: &EmbeddingSettings, api_key: Option<String>) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::OpenAi => {
            let key = api_key.ok_or_else(|| anyhow!("An API key is required for the openai embedding provider"))?;
            tracing::info!(model = %settings.model, base_url = %settings.base_url, "using OpenAI-compatible embeddings");
            Ok(Arc::new(OpenAiEmbedder::new(settings, key)?))
        }
        EmbeddingProvider::Hashing => {
            tracing::info!(dim = settings.dimension, "using hashing embeddings");
            Ok(Arc::new(HashingEmbedder::new(settings.dimension)?))
        }
    }
}
