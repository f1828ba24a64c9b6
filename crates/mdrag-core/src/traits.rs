use async_trait::async_trait;

/// Maps text to fixed-dimension vectors.
///
/// Implementations return one vector per input, in input order, each of
/// length `dim()`. The same embedder must be used to build an index and to
/// embed the questions asked against it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn id(&self) -> &str;
    /// Embedding dimensionality (d).
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// One prompt for a text-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Maps a prompt to the model's reply text.
#[async_trait]
pub trait Completer: Send + Sync {
    fn id(&self) -> &str;
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}
