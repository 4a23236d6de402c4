pub mod provider;
pub mod providers;

pub use provider::{CompletionParams, LlmError, Message, Role, SummarizationClient};
pub use providers::openai::OpenAiProvider;
