//! OpenAI-compatible embedding provider (`POST {base_url}/embeddings`).
//!
//! Works with any server speaking the same request/response shape (Azure
//! OpenAI, local inference servers). The API key is handed in by the caller.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use mdrag_core::traits::Embedder;

use crate::EmbeddingSettings;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dim: usize,
    max_batch_size: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings, api_key: String) -> Result<Self> {
        if settings.max_batch_size == 0 { bail!("embedding.max_batch_size must be greater than 0"); }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dim: settings.dimension,
            max_batch_size: settings.max_batch_size,
            id: format!("openai:{}:d{}", settings.model, settings.dimension),
        })
    }

    async fn call_embeddings_api(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingsRequest { model: &self.model, input: texts };
        tracing::debug!(count = texts.len(), model = %self.model, "requesting embeddings");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Embedding API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unable to read response body".to_string());
            bail!("Embedding API returned {}: {}", status, body);
        }

        let parsed: EmbeddingsResponse = response.json().await.context("Failed to parse embedding response")?;
        let mut data = parsed.data;
        if data.len() != texts.len() {
            bail!("Embedding API returned {} vectors for {} inputs", data.len(), texts.len());
        }
        // Sort by index to maintain input order
        data.sort_by_key(|d| d.index);
        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dim { Ok(d.embedding) }
                else { Err(anyhow!("dim mismatch: got {} expected {}", d.embedding.len(), self.dim)) }
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch_size) {
            out.extend(self.call_embeddings_api(batch).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
