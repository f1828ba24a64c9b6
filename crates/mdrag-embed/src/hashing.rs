//! Deterministic feature-hashing embedder.
//!
//! Each lowercased word is hashed into one of `dim` buckets; the bucket gets a
//! weight derived from the upper hash bits. Text with no alphanumeric words
//! (a `---` rule, a line of emoji) falls back to hashing its non-whitespace
//! characters. Vectors are L2-normalized. No model or network is involved, so
//! it suits tests and offline runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use mdrag_core::traits::Embedder;

pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { bail!("hashing embedder dimension must be greater than 0"); }
        Ok(Self { dim, id: format!("hashing:xxh64:d{dim}") })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut tokens: Vec<String> = words(text).collect();
        if tokens.is_empty() {
            tokens = text.chars().filter(|c| !c.is_whitespace()).map(String::from).collect();
        }
        if tokens.is_empty() { bail!("cannot embed blank text: {:?}", text); }
        let mut v = vec![0f32; self.dim];
        for (i, token) in tokens.iter().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}
