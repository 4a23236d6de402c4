use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("target_token_size must be greater than zero")]
    ZeroTargetTokenSize,

    #[error("llm_context_length must be greater than zero")]
    ZeroContextLength,

    #[error("chunking_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),

    #[error("user prompt must contain exactly one '{placeholder}' placeholder, found {found}")]
    UserPromptPlaceholder {
        placeholder: &'static str,
        found: usize,
    },

    #[error(
        "llm_context_length {context_length} leaves no room for chunks after reserving {reserved} tokens for the prompts"
    )]
    NoChunkBudget { context_length: usize, reserved: usize },
}
