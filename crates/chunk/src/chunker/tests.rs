//! Tests for the chunking strategies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::helpers::{cosine_similarity, pack, split_sentences, split_units};
use super::*;
use crate::embedding::{EmbeddingError, OpenAiEmbedder};
use crate::tokenizer::WhitespaceTokenCounter;

/// Embeds by topic keyword: cats along one axis, cars along the other.
struct TopicEmbedder {
    calls: AtomicUsize,
    embedded: AtomicUsize,
}

impl TopicEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            embedded: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed_batch(
        &self,
        texts: &[&str],
        _model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                if t.contains("cat") {
                    vec![1.0, 0.0]
                } else if t.contains("car") {
                    vec![0.0, 1.0]
                } else {
                    vec![0.7, 0.7]
                }
            })
            .collect())
    }
}

/// Rejects every request with a fixed HTTP status.
struct FailingEmbedder {
    status: u16,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(
        &self,
        _texts: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: self.status,
            body: format!("cannot embed with {model}"),
        })
    }
}

fn opts(strategy: ChunkStrategy, max_token_size: usize) -> SplitOptions {
    SplitOptions {
        strategy,
        max_token_size,
        similarity_threshold: 0.5,
        combine_threshold: 0.4,
        lookahead: 1,
        tokenizer_model: "whitespace".into(),
        embedding_model: "topic".into(),
    }
}

fn fixed_chunker() -> TextChunker {
    TextChunker::new(Arc::new(WhitespaceTokenCounter))
}

fn similarity_chunker(embedder: Arc<dyn Embedder>) -> TextChunker {
    TextChunker::new(Arc::new(WhitespaceTokenCounter)).with_embedder(embedder)
}

fn words(n: usize, prefix: &str) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

// ── Helpers ─────────────────────────────────────────────────────────

#[test]
fn sentences_split_on_terminal_punctuation() {
    let s = split_sentences("First one. Second one! Third? fourth stays");
    assert_eq!(s, vec!["First one.", "Second one!", "Third? fourth stays"]);
}

#[test]
fn units_follow_paragraphs_then_sentences() {
    let u = split_units("Para one. Still one.\n\n\n\nPara two.");
    assert_eq!(u, vec!["Para one.", "Still one.", "Para two."]);
}

#[test]
fn pack_respects_budget_and_order() {
    let pieces = vec!["a b".to_string(), "c".to_string(), "d e f".to_string(), "g".to_string()];
    let packed = pack(pieces, 3, &WhitespaceTokenCounter, "w").unwrap();
    assert_eq!(packed, vec!["a b c", "d e f", "g"]);
}

#[test]
fn cosine_handles_degenerate_vectors() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
}

// ── Fixed-size ──────────────────────────────────────────────────────

#[tokio::test]
async fn fixed_empty_input_yields_no_chunks() {
    let chunks = fixed_chunker()
        .split("  \n\n ", &opts(ChunkStrategy::FixedSize, 10))
        .await
        .unwrap();
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn fixed_chunks_fit_budget_and_keep_order() {
    let text = format!("{}. {}. {}.", words(7, "a"), words(7, "b"), words(30, "c"));
    let chunks = fixed_chunker()
        .split(&text, &opts(ChunkStrategy::FixedSize, 10))
        .await
        .unwrap();

    for c in &chunks {
        assert!(c.split_whitespace().count() <= 10, "chunk over budget: {c}");
    }
    let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
    let original: Vec<&str> = text.split_whitespace().collect();
    assert_eq!(rejoined, original);
}

#[tokio::test]
async fn fixed_packs_short_sentences_together() {
    let chunks = fixed_chunker()
        .split("One two. Three four. Five six.", &opts(ChunkStrategy::FixedSize, 4))
        .await
        .unwrap();
    assert_eq!(chunks, vec!["One two. Three four.", "Five six."]);
}

#[tokio::test]
async fn zero_budget_is_rejected() {
    let err = fixed_chunker()
        .split("text", &opts(ChunkStrategy::FixedSize, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ChunkError::ZeroBudget));
}

// ── Similarity ──────────────────────────────────────────────────────

#[tokio::test]
async fn similarity_requires_embedder() {
    let err = fixed_chunker()
        .split("Cats purr.", &opts(ChunkStrategy::Similarity, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ChunkError::EmbedderNotConfigured));
}

#[tokio::test]
async fn similarity_splits_at_topic_change() {
    let chunker = similarity_chunker(Arc::new(TopicEmbedder::new()));
    let chunks = chunker
        .split(
            "Cats purr. Cats sleep. Cars honk. Cars race.",
            &opts(ChunkStrategy::Similarity, 50),
        )
        .await
        .unwrap();
    assert_eq!(chunks, vec!["Cats purr. Cats sleep.", "Cars honk. Cars race."]);
}

#[tokio::test]
async fn lookahead_bridges_a_single_digression() {
    let chunker = similarity_chunker(Arc::new(TopicEmbedder::new()));
    let mut o = opts(ChunkStrategy::Similarity, 50);
    o.lookahead = 2;
    o.combine_threshold = 1.1; // disable combining to observe the split pass alone

    let chunks = chunker
        .split("Cats purr. Cars honk. Cats sleep.", &o)
        .await
        .unwrap();
    assert_eq!(chunks, vec!["Cats purr. Cars honk. Cats sleep."]);
}

#[tokio::test]
async fn combining_merges_similar_neighbours_within_budget() {
    let chunker = similarity_chunker(Arc::new(TopicEmbedder::new()));
    let mut o = opts(ChunkStrategy::Similarity, 50);
    o.similarity_threshold = 0.9;
    o.combine_threshold = 0.6;

    // "Birds sing." sits between the topics and is split off at 0.9, then
    // merged into the first chunk at the looser combine threshold.
    let chunks = chunker
        .split("Cats purr. Birds sing. Cars honk.", &o)
        .await
        .unwrap();
    assert_eq!(chunks, vec!["Cats purr. Birds sing.", "Cars honk."]);
}

#[tokio::test]
async fn similarity_chunks_never_exceed_budget() {
    let chunker = similarity_chunker(Arc::new(TopicEmbedder::new()));
    let text = format!("Cats {}. Cats {}. Cats {}.", words(4, "x"), words(4, "y"), words(12, "z"));
    let chunks = chunker
        .split(&text, &opts(ChunkStrategy::Similarity, 8))
        .await
        .unwrap();
    assert!(chunks.len() >= 3);
    for c in &chunks {
        assert!(c.split_whitespace().count() <= 8, "chunk over budget: {c}");
    }
}

#[tokio::test]
async fn repeated_sentences_are_served_from_cache() {
    let embedder = Arc::new(TopicEmbedder::new());
    let chunker = similarity_chunker(embedder.clone()).with_batch_size(1);
    let o = opts(ChunkStrategy::Similarity, 50);

    chunker.split("Cats purr. Cars honk.", &o).await.unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);

    chunker.split("Cats purr. Cars honk. Cats nap.", &o).await.unwrap();
    assert_eq!(embedder.embedded.load(Ordering::SeqCst), 3);
    assert_eq!(chunker.cache_stats().hits, 2);
    assert_eq!(chunker.cache_stats().misses, 3);
}

#[tokio::test]
async fn unknown_embedding_model_propagates() {
    let chunker = similarity_chunker(Arc::new(FailingEmbedder { status: 404 }));
    let err = chunker
        .split("Cats purr. Cars honk.", &opts(ChunkStrategy::Similarity, 50))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChunkError::Embedding(EmbeddingError::Api { status: 404, .. })
    ));
}

#[tokio::test]
async fn transient_embedding_failure_falls_back_to_fixed_size() {
    let text = format!("{}. {}. {}.", words(7, "a"), words(7, "b"), words(30, "c"));
    let expected = fixed_chunker()
        .split(&text, &opts(ChunkStrategy::FixedSize, 10))
        .await
        .unwrap();

    for status in [429, 503] {
        let chunks = similarity_chunker(Arc::new(FailingEmbedder { status }))
            .split(&text, &opts(ChunkStrategy::Similarity, 10))
            .await
            .unwrap();
        assert_eq!(chunks, expected, "status {status}");
    }
}

#[tokio::test]
async fn embedding_outage_over_http_still_chunks() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(None, format!("{}/v1", server.uri()));
    let chunks = similarity_chunker(Arc::new(embedder))
        .split("Cats purr. Cars honk.", &opts(ChunkStrategy::Similarity, 50))
        .await
        .unwrap();
    assert_eq!(chunks, vec!["Cats purr. Cars honk."]);
}
