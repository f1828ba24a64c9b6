use std::time::Duration;

use mdrag_core::error::{Error, Result};
use mdrag_core::traits::Embedder;
use mdrag_core::types::Chunk;
use mdrag_vector::{embed_texts, VectorIndex};

pub const DEFAULT_TOP_K: usize = 3;

/// Finds the chunks most similar to a question.
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    top_k: usize,
    call_timeout: Option<Duration>,
}

impl Default for Retriever {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K, call_timeout: None }
    }
}

impl Retriever {
    pub fn new(top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }
        Ok(Self { top_k, call_timeout: None })
    }

    /// Bound the question-embedding call.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` chunks in rank order. `embedder` must be the one the
    /// index was built with; a dimension mismatch is a `Config` error.
    pub async fn retrieve(&self, question: &str, embedder: &dyn Embedder, index: &VectorIndex) -> Result<Vec<Chunk>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dim) = index.dim() {
            if embedder.dim() != dim {
                return Err(Error::Config(format!(
                    "embedder {} produces {}-dimensional vectors but the index holds {}-dimensional vectors",
                    embedder.id(),
                    embedder.dim(),
                    dim
                )));
            }
        }
        let mut vectors = embed_texts(embedder, &[question.to_string()], self.call_timeout).await?;
        let query = vectors.pop().ok_or_else(|| Error::Embedding(format!("{} returned no vector", embedder.id())))?;
        Ok(index.search(&query, self.top_k)?.into_iter().map(|hit| hit.chunk).collect())
    }
}
