use super::{TokenCounter, TokenizerError};

/// Approximate token count via whitespace splitting. Ignores the tokenizer id.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count_tokens(&self, text: &str, _tokenizer_id: &str) -> Result<usize, TokenizerError> {
        Ok(text.split_whitespace().count())
    }
}
