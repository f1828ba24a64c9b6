//! Typed view over the layered configuration and assembly of the service.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mdrag_core::chunker::ChunkingConfig;
use mdrag_core::config::{resolve_with_base, Config, CorpusSettings, IndexSettings, RetrievalSettings, TimeoutSettings};
use mdrag_embed::{embedder_from_settings, EmbeddingSettings};
use mdrag_llm::{completer_from_settings, CompletionSettings};
use mdrag_qa::{QueryService, ServiceConfig};
use mdrag_vector::BuildOptions;

/// `[server]`: where the HTTP API listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000, enable_cors: false }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppSettings {
    pub corpus: CorpusSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub index: IndexSettings,
    pub timeouts: TimeoutSettings,
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub server: ServerSettings,
}

impl AppSettings {
    /// Read every section, falling back to defaults for absent ones.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            corpus: config.get_or_default("corpus")?,
            chunking: config.get_or_default("chunking")?,
            retrieval: config.get_or_default("retrieval")?,
            index: config.get_or_default("index")?,
            timeouts: config.get_or_default("timeouts")?,
            embedding: config.get_or_default("embedding")?,
            completion: config.get_or_default("completion")?,
            server: config.get_or_default("server")?,
        })
    }

    /// `None` when `timeouts.call_secs` is 0.
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.timeouts.call_secs > 0).then(|| Duration::from_secs(self.timeouts.call_secs))
    }

    pub fn corpus_root(&self, base_dir: &Path) -> PathBuf {
        resolve_with_base(base_dir, &self.corpus.root)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            pattern: self.corpus.pattern.clone(),
            chunking: self.chunking.clone(),
            top_k: self.retrieval.top_k,
            build: BuildOptions {
                batch_size: self.index.batch_size,
                concurrency: self.index.concurrency,
                call_timeout: self.call_timeout(),
            },
            call_timeout: self.call_timeout(),
        }
    }

    /// Wire providers and the query service. `api_key` is handed to every
    /// provider that talks to a remote API.
    pub fn build_service(&self, api_key: Option<String>) -> Result<QueryService> {
        let embedder = embedder_from_settings(&self.embedding, api_key.clone()).context("Failed to set up embeddings")?;
        let completer = completer_from_settings(&self.completion, api_key).context("Failed to set up completions")?;
        QueryService::new(embedder, completer, self.service_config()).context("Invalid service configuration")
    }
}
