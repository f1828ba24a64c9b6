use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mdrag_core::chunker::{Chunker, ChunkingConfig};
use mdrag_core::error::{Error, Result};
use mdrag_core::loader::{DocumentLoader, DEFAULT_PATTERN};
use mdrag_core::traits::{Completer, Embedder};
use mdrag_core::types::QueryResult;
use mdrag_vector::{BuildOptions, VectorIndex};

use crate::retriever::{Retriever, DEFAULT_TOP_K};
use crate::synthesizer::AnswerSynthesizer;

/// Everything that shapes how a corpus is indexed and queried.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// File-name glob selecting corpus files.
    pub pattern: String,
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub build: BuildOptions,
    /// Bound for each embedding or completion call made while answering.
    pub call_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            build: BuildOptions::default(),
            call_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready,
}

enum State {
    Uninitialized,
    Initializing,
    Ready(Arc<VectorIndex>),
}

/// Loads, chunks and indexes a corpus once, then answers questions against it.
///
/// `answer()` may be called concurrently from many tasks; it fails with
/// [`Error::NotReady`] until `initialize()` has completed.
pub struct QueryService {
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
    config: ServiceConfig,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    state: Mutex<State>,
}

impl QueryService {
    pub fn new(embedder: Arc<dyn Embedder>, completer: Arc<dyn Completer>, config: ServiceConfig) -> Result<Self> {
        config.chunking.validate()?;
        let retriever = Retriever::new(config.top_k)?.with_call_timeout(config.call_timeout);
        let synthesizer = AnswerSynthesizer::new(config.call_timeout);
        Ok(Self { embedder, completer, config, retriever, synthesizer, state: Mutex::new(State::Uninitialized) })
    }

    pub fn state(&self) -> ServiceState {
        match *self.lock() {
            State::Uninitialized => ServiceState::Uninitialized,
            State::Initializing => ServiceState::Initializing,
            State::Ready(_) => ServiceState::Ready,
        }
    }

    /// Number of indexed chunks, once ready.
    pub fn chunk_count(&self) -> Option<usize> {
        match &*self.lock() {
            State::Ready(index) => Some(index.len()),
            _ => None,
        }
    }

    /// Load, chunk and index the corpus under `corpus_root`.
    ///
    /// A no-op once ready. Fails with `NotReady` while another call is still
    /// building. On failure, or if the returned future is dropped early, the
    /// service goes back to `Uninitialized` and may be initialized again.
    pub async fn initialize(&self, corpus_root: &Path) -> Result<()> {
        {
            let mut state = self.lock();
            match *state {
                State::Ready(_) => return Ok(()),
                State::Initializing => {
                    return Err(Error::NotReady("initialization is already in progress".to_string()))
                }
                State::Uninitialized => {}
            }
            *state = State::Initializing;
        }
        let latch = InitLatch { state: &self.state, armed: true };
        let index = self.build_index(corpus_root).await?;
        latch.complete(index);
        Ok(())
    }

    async fn build_index(&self, corpus_root: &Path) -> Result<VectorIndex> {
        let documents = DocumentLoader::new(&self.config.pattern)?.load(corpus_root)?;
        let chunks = Chunker::new(self.config.chunking.clone())?.split(&documents);
        let options = BuildOptions { call_timeout: self.config.call_timeout, ..self.config.build };
        VectorIndex::build_with(chunks, self.embedder.as_ref(), options).await
    }

    /// Retrieve context for `question` and ask the model to answer from it.
    pub async fn answer(&self, question: &str) -> Result<QueryResult> {
        let index = self.ready_index()?;
        let chunks = self.retriever.retrieve(question, self.embedder.as_ref(), &index).await?;
        self.synthesizer.synthesize(question, &chunks, self.completer.as_ref()).await
    }

    fn ready_index(&self) -> Result<Arc<VectorIndex>> {
        match &*self.lock() {
            State::Ready(index) => Ok(Arc::clone(index)),
            State::Initializing => Err(Error::NotReady("the index is still being built".to_string())),
            State::Uninitialized => Err(Error::NotReady("the service has not been initialized".to_string())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while a build runs; resets the state unless the build completes.
struct InitLatch<'a> {
    state: &'a Mutex<State>,
    armed: bool,
}

impl InitLatch<'_> {
    fn complete(mut self, index: VectorIndex) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = State::Ready(Arc::new(index));
        self.armed = false;
    }
}

impl Drop for InitLatch<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = State::Uninitialized;
        }
    }
}
