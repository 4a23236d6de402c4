use std::path::PathBuf;

use clap::Parser;
use distillery_core::Config;

/// Distill a long text into a token budget.
///
/// The text is split into chunks, each chunk is summarized by an
/// OpenAI-compatible LLM, and the summaries are joined and re-distilled until
/// the result fits. Settings come from the environment (and `.env`); flags
/// override them.
#[derive(Parser, Debug)]
#[command(name = "distillery", about = "Distill long texts into a token budget with an LLM")]
pub struct CliArgs {
    /// Input file (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Write the distilled text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration profile; keys resolve as `{PROFILE}_{KEY}` first
    #[arg(long, env = "DISTILLERY_PROFILE")]
    pub profile: Option<String>,

    /// Target size of the result in tokens
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Maximum number of compression loops
    #[arg(long)]
    pub loops: Option<usize>,

    /// Similarity threshold used for chunking, in [0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Pack sentences up to the token budget instead of following similarity
    #[arg(long)]
    pub fixed_size: bool,

    /// Context window of the summarization model in tokens
    #[arg(long)]
    pub context_length: Option<usize>,

    /// Delay before every summarization request, in milliseconds
    #[arg(long)]
    pub rate_limit: Option<u64>,

    /// Tokenizer model used for all token counts
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Embedding model used for similarity chunking
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// Summarization model name
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (overrides LLM_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Print run statistics as JSON to stderr
    #[arg(long)]
    pub stats: bool,
}

impl CliArgs {
    /// Layer the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        let d = &mut config.distillation;
        if let Some(v) = self.target {
            d.target_token_size = v;
        }
        if let Some(v) = self.loops {
            d.max_distillation_loops = v;
        }
        if let Some(v) = self.threshold {
            d.chunking_threshold = v;
        }
        if self.fixed_size {
            d.use_chunking_threshold = false;
        }
        if let Some(v) = self.context_length {
            d.llm_context_length = v;
        }
        if let Some(v) = self.rate_limit {
            d.llm_api_rate_limit = v;
        }
        if let Some(v) = &self.tokenizer {
            d.tokenizer_model = v.clone();
        }
        if let Some(v) = &self.embedding_model {
            d.embedding_model = v.clone();
        }

        if let Some(v) = &self.model {
            config.llm.model = v.clone();
        }
        // Embedding settings inherited from the LLM endpoint follow it.
        if let Some(v) = &self.base_url {
            if config.embedding.base_url == config.llm.base_url {
                config.embedding.base_url = v.clone();
            }
            config.llm.base_url = v.clone();
        }
        if let Some(v) = &self.api_key {
            if config.embedding.api_key == config.llm.api_key {
                config.embedding.api_key = Some(v.clone());
            }
            config.llm.api_key = Some(v.clone());
        }
    }
}
