use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mdrag_core::chunker::split;
use mdrag_core::loader::load_markdown;
use mdrag_core::traits::Embedder;
use mdrag_core::types::Chunk;
use mdrag_core::Error;
use mdrag_embed::HashingEmbedder;
use mdrag_vector::{BuildOptions, VectorIndex};
use tempfile::TempDir;

fn write_corpus(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("survival")).unwrap();
    fs::write(dir.join("survival/fire.md"), "Building a fire needs tinder, kindling and fuel wood.\n\nKeep the fire small.").unwrap();
    fs::write(dir.join("survival/water.md"), "Boil water for one minute to make it safe to drink.").unwrap();
    fs::write(dir.join("network.md"), "Configure the network interface with netplan.\n\nRestart networking afterwards.").unwrap();
    fs::write(dir.join("kernel.md"), "The Linux kernel manages memory and processes.").unwrap();
}

fn chunk(i: usize) -> Chunk {
    Chunk { text: format!("text {i}"), source: format!("doc{i}.md"), sequence_index: 0, span: 0..6 }
}

/// Encodes each input's numeric suffix as a one-hot vector, with a delay that
/// makes later batches finish first.
struct OneHotEmbedder {
    dim: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for OneHotEmbedder {
    fn id(&self) -> &str { "one-hot" }
    fn dim(&self) -> usize { self.dim }
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(call as u64 * 10))).await;
        Ok(texts
            .iter()
            .map(|t| {
                let n: usize = t.trim_start_matches("text ").parse().unwrap_or(0);
                let mut v = vec![0.0; self.dim];
                v[n % self.dim] = 1.0;
                v
            })
            .collect())
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { 4 }
    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("rejected input")
    }
}

struct StalledEmbedder;

#[async_trait]
impl Embedder for StalledEmbedder {
    fn id(&self) -> &str { "stalled" }
    fn dim(&self) -> usize { 4 }
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![vec![0.0; 4]; texts.len()])
    }
}

#[tokio::test]
async fn corpus_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    write_corpus(tmp.path());
    let docs = load_markdown(tmp.path()).expect("load");
    let chunks = split(&docs, 512, 100).expect("split");
    assert_eq!(chunks.len(), 4);

    let embedder = HashingEmbedder::new(256).unwrap();
    let index = VectorIndex::build(chunks, &embedder).await.expect("build");
    assert_eq!(index.len(), 4);
    assert_eq!(index.dim(), Some(256));

    let q = embedder.embed_text("how do I keep a fire going").unwrap();
    let results = index.search(&q, 3).expect("search");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk.source, "survival/fire.md");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must be non-increasing");
    }

    let again = index.search(&q, 3).expect("search");
    assert_eq!(results, again, "repeated searches return identical results");
}

#[tokio::test]
async fn top_k_is_bounded_by_index_size() {
    let embedder = HashingEmbedder::new(64).unwrap();
    let chunks = vec![chunk(1), chunk(2)];
    let index = VectorIndex::build(chunks, &embedder).await.unwrap();
    let q = embedder.embed_text("text").unwrap();

    assert_eq!(index.search(&q, 3).unwrap().len(), 2);
    assert_eq!(index.search(&q, 1).unwrap().len(), 1);
}

#[tokio::test]
async fn batches_in_flight_keep_chunk_order() {
    let embedder = OneHotEmbedder { dim: 16, calls: AtomicUsize::new(0) };
    let chunks: Vec<Chunk> = (0..10).map(chunk).collect();
    let options = BuildOptions { batch_size: 3, concurrency: 4, call_timeout: None };

    let index = VectorIndex::build_with(chunks, &embedder, options).await.expect("build");

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
    for i in 0..10 {
        let mut q = vec![0.0; 16];
        q[i] = 1.0;
        let top = index.search(&q, 1).unwrap();
        assert_eq!(top[0].chunk.source, format!("doc{i}.md"));
        assert!((top[0].score - 1.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn build_runs_on_a_spawned_task() {
    let embedder = std::sync::Arc::new(OneHotEmbedder { dim: 16, calls: AtomicUsize::new(0) });
    let chunks: Vec<Chunk> = (0..6).map(chunk).collect();
    let options = BuildOptions { batch_size: 2, concurrency: 2, call_timeout: Some(Duration::from_secs(5)) };

    let task = {
        let embedder = embedder.clone();
        tokio::spawn(async move { VectorIndex::build_with(chunks, embedder.as_ref(), options).await })
    };
    let index = task.await.expect("task").expect("build");

    assert_eq!(index.len(), 6);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn embedder_failure_aborts_build() {
    let err = VectorIndex::build(vec![chunk(0), chunk(1)], &FailingEmbedder).await.unwrap_err();
    assert!(matches!(&err, Error::Embedding(msg) if msg.contains("rejected input")), "got {err:?}");
}

#[tokio::test]
async fn stalled_embedder_times_out() {
    let options = BuildOptions { call_timeout: Some(Duration::from_millis(50)), ..BuildOptions::default() };
    let err = VectorIndex::build_with(vec![chunk(0)], &StalledEmbedder, options).await.unwrap_err();
    assert!(matches!(err, Error::Embedding(_)), "got {err:?}");
}

#[tokio::test]
async fn query_dimension_must_match() {
    let embedder = HashingEmbedder::new(8).unwrap();
    let index = VectorIndex::build(vec![chunk(0)], &embedder).await.unwrap();

    assert!(matches!(index.search(&[1.0, 0.0], 1), Err(Error::Config(_))));
    assert!(matches!(index.search(&[0.5; 8], 0), Err(Error::Config(_))));
}

#[tokio::test]
async fn empty_index_returns_no_hits() {
    let index = VectorIndex::build(Vec::new(), &FailingEmbedder).await.expect("empty build never calls the embedder");
    assert!(index.is_empty());
    assert_eq!(index.dim(), None);
    assert!(index.search(&[1.0, 0.0, 0.0], 3).unwrap().is_empty());
}
