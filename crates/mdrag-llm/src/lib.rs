//! Chat-completion providers behind the core `Completer` trait.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use mdrag_core::traits::Completer;

pub mod openai;

pub use openai::OpenAiCompleter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    OpenAi,
}

/// `[completion]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub provider: CompletionProvider,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: CompletionProvider::OpenAi,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 60,
            max_tokens: None,
        }
    }
}

pub fn completer_from_settings(settings: &CompletionSettings, api_key: Option<String>) -> Result<Arc<dyn Completer>> {
    match settings.provider {
        CompletionProvider::OpenAi => {
            let key = api_key.ok_or_else(|| anyhow!("An API key is required for the openai completion provider"))?;
            tracing::info!(model = %settings.model, base_url = %settings.base_url, "using OpenAI-compatible chat completions");
            Ok(Arc::new(OpenAiCompleter::new(settings, key)?))
        }
    }
}
