//! Message construction and the token arithmetic around prompts.

use distillery_core::{ConfigError, DistillationConfig, TEXT_PLACEHOLDER};
use distillery_llm::{CompletionParams, Message};

/// Tokens reserved per character of prompt text when sizing chunks.
const PROMPT_TOKENS_PER_CHAR: f64 = 1.5;

/// Average tokens per word used to turn a token target into a word limit.
const TOKENS_PER_WORD: f64 = 1.45;

/// Largest chunk the chunker may produce: the context window minus a
/// conservative reservation for the system prompt and the fixed text of the
/// user prompt template.
pub fn chunking_token_size(config: &DistillationConfig) -> Result<usize, ConfigError> {
    let template_chars = config
        .user_prompt
        .chars()
        .count()
        .saturating_sub(TEXT_PLACEHOLDER.chars().count());
    let chars = (config.system_prompt.chars().count() + template_chars) as f64;
    let reserved = (chars * PROMPT_TOKENS_PER_CHAR).ceil() as usize;
    if config.llm_context_length <= reserved {
        return Err(ConfigError::NoChunkBudget {
            context_length: config.llm_context_length,
            reserved,
        });
    }
    Ok(config.llm_context_length - reserved)
}

/// Word limit handed to the model on the forced pass.
pub fn word_budget(target_token_size: usize) -> usize {
    (target_token_size as f64 / TOKENS_PER_WORD).floor() as usize
}

/// Substitute `text` into the user prompt template.
pub fn render_user_prompt(template: &str, text: &str) -> String {
    template.replacen(TEXT_PLACEHOLDER, text, 1)
}

/// Messages for summarizing one chunk.
pub fn chunk_messages(config: &DistillationConfig, chunk: &str) -> Vec<Message> {
    vec![
        Message::system(config.system_prompt.clone()),
        Message::user(render_user_prompt(&config.user_prompt, chunk)),
    ]
}

/// Messages for the final pass: the whole text with an explicit word limit.
pub fn forced_messages(config: &DistillationConfig, text: &str) -> Vec<Message> {
    let words = word_budget(config.target_token_size);
    let system = format!(
        "{}\nThe summary must not exceed {words} words.",
        config.system_prompt
    );
    vec![
        Message::system(system),
        Message::user(render_user_prompt(&config.user_prompt, text)),
    ]
}

pub fn completion_params(config: &DistillationConfig) -> CompletionParams {
    CompletionParams {
        stop: config.stop_tokens.clone(),
        max_gen_length: config.llm_max_gen_length,
        temperature: config.llm_temperature,
    }
}
