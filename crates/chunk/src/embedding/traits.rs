use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Whether retrying later could succeed. Rejections such as an unknown
    /// model, a bad request or missing credentials are not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::CountMismatch { .. } => true,
            Self::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
        }
    }
}

/// Trait for sentence-embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts with `model`, returning one vector per input text (in order).
    ///
    /// An unknown model must surface as an error rather than an empty result.
    async fn embed_batch(&self, texts: &[&str], model: &str)
        -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
