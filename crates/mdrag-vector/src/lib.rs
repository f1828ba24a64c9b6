//! In-memory exact vector index over embedded chunks.
//!
//! Built once from a corpus snapshot and read-only afterwards, so concurrent
//! searches need no locking. Similarity is cosine: vectors are L2-normalized
//! on insert and queries are scored by inner product.

pub mod embed;
pub mod index;
pub mod similarity;

pub use embed::embed_texts;
pub use index::{BuildOptions, VectorIndex};
