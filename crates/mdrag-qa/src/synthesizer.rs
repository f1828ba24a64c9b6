use std::time::Duration;

use mdrag_core::error::{Error, Result};
use mdrag_core::traits::{Completer, CompletionRequest};
use mdrag_core::types::{Chunk, QueryResult};

/// Returned when no chunk could be retrieved; the model is not consulted.
pub const NO_CONTEXT_ANSWER: &str = "I could not find any relevant context in the indexed documents.";

const SYSTEM_PREAMBLE: &str = "Use the following pieces of context to answer the user's question.\n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

/// Prompt for `question` grounded in `chunks`, in the given order.
pub fn build_prompt(question: &str, chunks: &[Chunk]) -> CompletionRequest {
    let context = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    CompletionRequest {
        system: format!("{SYSTEM_PREAMBLE}{context}"),
        user: question.to_string(),
        temperature: 0.0,
    }
}

/// Turns retrieved chunks and a question into an answer with citations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerSynthesizer {
    call_timeout: Option<Duration>,
}

impl AnswerSynthesizer {
    pub fn new(call_timeout: Option<Duration>) -> Self {
        Self { call_timeout }
    }

    /// `sources` lists one entry per chunk, in chunk order. A file cited by
    /// several chunks appears several times.
    pub async fn synthesize(&self, question: &str, chunks: &[Chunk], completer: &dyn Completer) -> Result<QueryResult> {
        if chunks.is_empty() {
            return Ok(QueryResult { answer: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new() });
        }
        let request = build_prompt(question, chunks);
        let call = completer.complete(&request);
        let answer = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                Error::Synthesis(format!("{} did not respond within {:?}", completer.id(), limit))
            })?,
            None => call.await,
        }
        .map_err(|e| Error::synthesis(&e))?;

        Ok(QueryResult { answer, sources: chunks.iter().map(|c| c.source.clone()).collect() })
    }
}
