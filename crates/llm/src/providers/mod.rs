pub mod openai;

use std::sync::Arc;

use distillery_core::config::LlmConfig;

use crate::provider::SummarizationClient;

/// Create the summarization client described by config.
pub fn create_provider(llm_config: &LlmConfig) -> Arc<dyn SummarizationClient> {
    Arc::new(openai::OpenAiProvider::new(
        llm_config.api_key.clone(),
        llm_config.model.clone(),
        llm_config.base_url.clone(),
    ))
}
