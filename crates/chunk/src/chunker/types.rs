//! Chunking options and errors.

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::tokenizer::TokenizerError;

/// How a text is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Split where adjacent sentences stop being similar, then merge similar neighbours.
    Similarity,
    /// Pack sentences densely up to the token budget.
    FixedSize,
}

/// Options for one `split` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    pub strategy: ChunkStrategy,
    /// Upper bound on every returned chunk, counted with `tokenizer_model`.
    pub max_token_size: usize,
    /// Adjacent sentences at or above this similarity stay in one chunk.
    pub similarity_threshold: f32,
    /// Adjacent chunks at or above this similarity are merged when they fit.
    pub combine_threshold: f32,
    /// Number of upcoming sentences compared before deciding to split.
    pub lookahead: usize,
    pub tokenizer_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("similarity chunking requested but no embedder is configured")]
    EmbedderNotConfigured,

    #[error("max_token_size must be greater than zero")]
    ZeroBudget,
}
