//! Question answering over an indexed Markdown corpus.
//!
//! [`QueryService`] owns the readiness state and the built index; each
//! `answer()` call runs [`Retriever`] then [`AnswerSynthesizer`] and shares
//! nothing mutable with concurrent calls.

pub mod retriever;
pub mod service;
pub mod synthesizer;

pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use service::{QueryService, ServiceConfig, ServiceState};
pub use synthesizer::{build_prompt, AnswerSynthesizer, NO_CONTEXT_ANSWER};
