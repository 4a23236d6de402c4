//! Budget-aware text chunking.
//!
//! Splits a text into ordered segments that each fit a token budget, either by
//! packing sentences densely (fixed-size) or by following sentence-embedding
//! similarity (similarity-threshold).

mod fixed;
mod helpers;
mod semantic;
mod types;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::embedding::{CacheStats, Embedder, EmbeddingCache};
use crate::tokenizer::TokenCounter;

pub use types::{ChunkError, ChunkStrategy, SplitOptions};

const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 64;
const DEFAULT_EMBEDDING_CACHE_SIZE: usize = 4096;

/// Splits text into ordered chunks.
///
/// Every returned chunk is at most `max_token_size` tokens under
/// `tokenizer_model`, chunks appear in document order, and empty input yields
/// no chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    async fn split(&self, text: &str, opts: &SplitOptions) -> Result<Vec<String>, ChunkError>;
}

/// Default [`Chunker`], dispatching on [`ChunkStrategy`].
///
/// When the embedding backend fails transiently, similarity chunking degrades
/// to fixed-size chunking for that call. Rejections (unknown model, bad
/// credentials) are returned as errors.
pub struct TextChunker {
    counter: Arc<dyn TokenCounter>,
    embedder: Option<Arc<dyn Embedder>>,
    cache: Mutex<EmbeddingCache>,
    batch_size: usize,
}

impl TextChunker {
    /// A chunker that can only serve [`ChunkStrategy::FixedSize`] until an
    /// embedder is attached.
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter,
            embedder: None,
            cache: Mutex::new(EmbeddingCache::new(DEFAULT_EMBEDDING_CACHE_SIZE)),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Mutex::new(EmbeddingCache::new(capacity));
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embedding cache counters accumulated over every `split` call.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }
}

#[async_trait]
impl Chunker for TextChunker {
    async fn split(&self, text: &str, opts: &SplitOptions) -> Result<Vec<String>, ChunkError> {
        if opts.max_token_size == 0 {
            return Err(ChunkError::ZeroBudget);
        }
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let chunks = match opts.strategy {
            ChunkStrategy::FixedSize => fixed::chunk_fixed(text, opts, self.counter.as_ref())?,
            ChunkStrategy::Similarity => {
                let embedder = self
                    .embedder
                    .as_deref()
                    .ok_or(ChunkError::EmbedderNotConfigured)?;
                let similar = semantic::chunk_by_similarity(
                    text,
                    opts,
                    self.counter.as_ref(),
                    embedder,
                    &self.cache,
                    self.batch_size,
                )
                .await;
                match similar {
                    Ok(chunks) => chunks,
                    Err(ChunkError::Embedding(e)) if e.is_transient() => {
                        tracing::warn!(
                            error = %e,
                            "embeddings unavailable, falling back to fixed-size chunks"
                        );
                        fixed::chunk_fixed(text, opts, self.counter.as_ref())?
                    }
                    Err(e) => return Err(e),
                }
            }
        };
        tracing::debug!(
            strategy = ?opts.strategy,
            chunks = chunks.len(),
            max_tokens = opts.max_token_size,
            "split text"
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests;
