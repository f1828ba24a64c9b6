//! OpenAI-compatible chat completions (`POST {base_url}/chat/completions`).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use mdrag_core::traits::{Completer, CompletionRequest};

use crate::CompletionSettings;

pub struct OpenAiCompleter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
    id: String,
}

impl OpenAiCompleter {
    pub fn new(settings: &CompletionSettings, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            id: format!("openai:{}", settings.model),
        })
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    fn id(&self) -> &str { &self.id }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message { role: "system", content: &request.system },
                Message { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(model = %self.model, prompt_chars = request.system.len() + request.user.len(), "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Completion API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "unable to read response body".to_string());
            bail!("Completion API returned {}: {}", status, text);
        }

        let parsed: ChatResponse = response.json().await.context("Failed to parse completion response")?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            bail!("Completion API returned no choices");
        };
        match choice.message.content {
            Some(content) => Ok(content),
            None => bail!("Completion API returned an empty message"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
