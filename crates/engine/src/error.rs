use distillery_chunk::{ChunkError, TokenizerError};
use distillery_core::ConfigError;
use distillery_llm::LlmError;
use thiserror::Error;

use crate::payload::PayloadError;

/// Errors that abort a distillation run. All of them are configuration
/// problems; summarization quality issues never surface here.
#[derive(Debug, Error)]
pub enum DistillError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("token counting failed: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkError),
}

/// Why a single summarization produced no usable text. Recovered locally.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarization call failed: {0}")]
    Client(#[from] LlmError),

    #[error("unusable summary payload: {0}")]
    Payload(#[from] PayloadError),
}
