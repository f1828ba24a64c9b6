use std::time::Duration;

use mdrag_core::error::{Error, Result};
use mdrag_core::traits::Embedder;

/// Embed `texts` with one provider call, bounded by `timeout` when set.
///
/// Provider failures, expiry and a wrong number or shape of vectors all
/// surface as [`Error::Embedding`].
pub async fn embed_texts(embedder: &dyn Embedder, texts: &[String], timeout: Option<Duration>) -> Result<Vec<Vec<f32>>> {
    let call = embedder.embed_batch(texts);
    let vectors = match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            Error::Embedding(format!("{} did not respond within {:?}", embedder.id(), limit))
        })?,
        None => call.await,
    }
    .map_err(|e| Error::embedding(&e))?;

    if vectors.len() != texts.len() {
        return Err(Error::Embedding(format!(
            "{} returned {} vectors for {} inputs",
            embedder.id(),
            vectors.len(),
            texts.len()
        )));
    }
    let dim = embedder.dim();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(Error::Embedding(format!(
            "{} returned a {}-dimensional vector, expected {}",
            embedder.id(),
            bad.len(),
            dim
        )));
    }
    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        return Err(Error::Embedding(format!("{} returned a non-finite vector", embedder.id())));
    }
    Ok(vectors)
}
