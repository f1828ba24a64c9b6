//! Domain types shared by the loader, chunker, index and query service.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A corpus file read at ingestion time.
///
/// - `text`: full UTF-8 contents of the file
/// - `source`: path relative to the corpus root, `/`-separated; unique per file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    pub source: String,
}

/// A bounded span of one document; the unit of embedding and retrieval.
///
/// - `source`: inherited from the parent document (shared by its chunks)
/// - `sequence_index`: position among the chunks of the same source
/// - `span`: byte range of `text` inside the parent document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub sequence_index: usize,
    pub span: Range<usize>,
}

/// A chunk returned by the index. `score` is cosine similarity; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// The answer to one question.
///
/// `sources` lists the `source` of every context chunk in retrieval rank
/// order. A file contributing several chunks appears once per chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
}
