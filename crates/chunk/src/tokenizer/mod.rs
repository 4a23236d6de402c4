//! Token counting used for budget checks and chunk sizing.

mod hf;
mod registry;
mod whitespace;

pub use hf::HfTokenCounter;
pub use registry::{is_supported, SUPPORTED_TOKENIZERS};
pub use whitespace::WhitespaceTokenCounter;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("tokenizer model '{0}' is not in the list of supported tokenizer models")]
    UnknownModel(String),

    #[error("failed to load tokenizer '{model}': {reason}")]
    Load { model: String, reason: String },

    #[error("failed to encode text with '{model}': {reason}")]
    Encode { model: String, reason: String },
}

/// Counts tokens of a text under a named tokenizer.
///
/// Counts are deterministic for identical inputs. An unknown tokenizer id is a
/// configuration error and is never recovered from.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str, tokenizer_id: &str) -> Result<usize, TokenizerError>;
}
