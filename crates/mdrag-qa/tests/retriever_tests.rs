use async_trait::async_trait;
use mdrag_core::traits::Embedder;
use mdrag_core::types::Chunk;
use mdrag_core::Error;
use mdrag_embed::HashingEmbedder;
use mdrag_qa::Retriever;
use mdrag_vector::VectorIndex;

struct UnreachableEmbedder;

#[async_trait]
impl Embedder for UnreachableEmbedder {
    fn id(&self) -> &str { "unreachable" }
    fn dim(&self) -> usize { 64 }
    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedder must not be called")
    }
}

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk { text: (*t).to_string(), source: format!("doc{i}.md"), sequence_index: 0, span: 0..t.len() })
        .collect()
}

const TOPICS: [&str; 5] = [
    "Install packages with apt install.",
    "Configure the firewall with ufw allow.",
    "List running services with systemctl.",
    "Mount a disk by editing fstab.",
    "Add a user with adduser and set a password.",
];

#[tokio::test]
async fn returns_top_k_chunks_in_rank_order() {
    let embedder = HashingEmbedder::new(128).unwrap();
    let index = VectorIndex::build(chunks(&TOPICS), &embedder).await.unwrap();
    let retriever = Retriever::default();

    let found = retriever.retrieve("which ufw rules allow firewall traffic", &embedder, &index).await.unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(found[0].source, "doc1.md");

    let query = embedder.embed_text("which ufw rules allow firewall traffic").unwrap();
    let ranked: Vec<Chunk> = index.search(&query, 3).unwrap().into_iter().map(|h| h.chunk).collect();
    assert_eq!(found, ranked);
}

#[tokio::test]
async fn result_size_is_min_of_k_and_index_size() {
    let embedder = HashingEmbedder::new(128).unwrap();
    let small = VectorIndex::build(chunks(&TOPICS[..2]), &embedder).await.unwrap();
    let retriever = Retriever::new(3).unwrap();

    assert_eq!(retriever.retrieve("apt", &embedder, &small).await.unwrap().len(), 2);
    assert_eq!(Retriever::new(1).unwrap().retrieve("apt", &embedder, &small).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_index_skips_the_embedder() {
    let found = Retriever::default().retrieve("anything", &UnreachableEmbedder, &VectorIndex::empty()).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn mismatched_embedder_is_a_configuration_error() {
    let index = VectorIndex::build(chunks(&TOPICS), &HashingEmbedder::new(32).unwrap()).await.unwrap();
    let other = HashingEmbedder::new(64).unwrap();

    let err = Retriever::default().retrieve("apt", &other, &index).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}
