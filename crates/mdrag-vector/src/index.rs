use futures::{stream, StreamExt, TryStreamExt};
use std::time::Duration;

use mdrag_core::error::{Error, Result};
use mdrag_core::traits::Embedder;
use mdrag_core::types::{Chunk, SearchHit};

use crate::embed::embed_texts;
use crate::similarity::{dot, normalize};

/// How chunk texts are sent to the embedder while building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Chunks per embedder call.
    pub batch_size: usize,
    /// Embedder calls in flight at once.
    pub concurrency: usize,
    /// Upper bound for each embedder call.
    pub call_timeout: Option<Duration>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: 64, concurrency: 4, call_timeout: None }
    }
}

#[derive(Debug, Clone)]
struct EmbeddedChunk {
    chunk: Chunk,
    /// L2-normalized.
    vector: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
    dim: Option<usize>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        Self::build_with(chunks, embedder, BuildOptions::default()).await
    }

    /// Embed every chunk and store it. Any embedder failure aborts the build;
    /// no partially built index is ever returned.
    pub async fn build_with(chunks: Vec<Chunk>, embedder: &dyn Embedder, options: BuildOptions) -> Result<Self> {
        if options.batch_size == 0 || options.concurrency == 0 {
            return Err(Error::Config("index batch_size and concurrency must be at least 1".to_string()));
        }
        if chunks.is_empty() {
            return Ok(Self::empty());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let timeout = options.call_timeout;
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(options.batch_size).map(<[String]>::to_vec))
            .map(move |batch| async move { embed_texts(embedder, &batch, timeout).await })
            .buffered(options.concurrency)
            .try_collect()
            .await?;
        Self::from_embeddings(chunks, batches.into_iter().flatten().collect())
    }

    /// Assemble an index from precomputed vectors, one per chunk, in order.
    pub fn from_embeddings(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::Embedding(format!("{} vectors for {} chunks", vectors.len(), chunks.len())));
        }
        let dim = vectors.first().map(Vec::len);
        if let Some(d) = dim {
            if d == 0 {
                return Err(Error::Embedding("embedding vectors must not be empty".to_string()));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != d) {
                return Err(Error::Embedding(format!("mixed vector dimensions: {} and {}", d, bad.len())));
            }
        }
        if let Some(i) = vectors.iter().position(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(Error::Embedding(format!("vector {i} has non-finite components")));
        }
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector: normalize(&vector) })
            .collect();
        Ok(Self { entries, dim })
    }

    /// Exact top-k by cosine similarity, best first. Equal scores keep
    /// insertion order. An empty index yields no hits for any query.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::Config("k must be at least 1".to_string()));
        }
        let Some(dim) = self.dim else { return Ok(Vec::new()) };
        if query.len() != dim {
            return Err(Error::Config(format!(
                "query vector has dimension {} but the index holds {}-dimensional vectors",
                query.len(),
                dim
            )));
        }
        let q = normalize(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let s = dot(&q, &e.vector);
                (i, if s.is_nan() { f32::NEG_INFINITY } else { s })
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension, or `None` while the index holds nothing.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(i: usize) -> Chunk {
        Chunk { text: format!("chunk {i}"), source: format!("doc{i}.md"), sequence_index: 0, span: 0..7 }
    }

    #[test]
    fn ties_keep_insertion_order() {
        let chunks = (0..4).map(chunk).collect();
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]];
        let index = VectorIndex::from_embeddings(chunks, vectors).unwrap();

        let hits = index.search(&[1.0, 0.0], 4).unwrap();
        let sources: Vec<&str> = hits.iter().map(|h| h.chunk.source.as_str()).collect();

        assert_eq!(sources, vec!["doc0.md", "doc2.md", "doc3.md", "doc1.md"]);
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let err = VectorIndex::from_embeddings(vec![chunk(0), chunk(1)], vec![vec![1.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let err = VectorIndex::from_embeddings(vec![chunk(0)], vec![]).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn non_finite_vectors_are_rejected() {
        let vectors = vec![vec![f32::INFINITY, 0.0], vec![f32::NAN, 1.0]];
        let err = VectorIndex::from_embeddings(vec![chunk(0), chunk(1)], vectors).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)), "got {err:?}");

        let err = VectorIndex::from_embeddings(vec![chunk(0), chunk(1)], vec![vec![1.0, 0.0], vec![0.0, f32::NAN]])
            .unwrap_err();
        assert!(matches!(&err, Error::Embedding(msg) if msg.contains("vector 1")), "got {err:?}");
    }
}
