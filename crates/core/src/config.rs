use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder in the user prompt template that gets replaced with the chunk text.
pub const TEXT_PLACEHOLDER: &str = "<<<text>>>";

const DEFAULT_TOKENIZER_MODEL: &str = "Xenova/paraphrase-multilingual-MiniLM-L12-v2";

/// Served by the default LLM endpoint's `/embeddings` route.
const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-base-en-v1.5";

const DEFAULT_SYSTEM_PROMPT: &str = r#"Please summarize the text snippet provided by the user. Your response should strictly follow this JSON format: {"summary": "your_summary_here"}. Do not include any additional text or explanation in your response. Here is an example for clarity:

Example input: "A big brown fox jumped over the lazy dog."
Correct output: {"summary": "A fox jumped over a dog."}"#;

const DEFAULT_USER_PROMPT: &str = "Now, summarize the following text snippet:\ntext_snippet:::\n<<<text>>>";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

/// Parse stop tokens given either as a JSON array (`["<|eot_id|>"]`) or a bare token.
pub fn parse_stop_tokens(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    serde_json::from_str::<Vec<String>>(trimmed).unwrap_or_else(|_| vec![trimmed.to_string()])
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub tokenizer: TokenizerConfig,
    pub distillation: DistillationConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DISTILLERY_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DISTILLERY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let llm = LlmConfig::from_env_profiled(p);
        Self {
            profile: p.to_string(),
            embedding: EmbeddingConfig::from_env_profiled(p, &llm),
            tokenizer: TokenizerConfig::from_env_profiled(p),
            distillation: DistillationConfig::from_env_profiled(p),
            llm,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let d = &self.distillation;
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  llm:          base_url={}, model={}, api_key={}",
            self.llm.base_url,
            self.llm.model,
            if self.llm.api_key.is_some() { "set" } else { "(none)" }
        );
        tracing::info!(
            "  embedding:    base_url={}, batch_size={}",
            self.embedding.base_url,
            self.embedding.batch_size
        );
        tracing::info!(
            "  tokenizer:    cache_dir={}",
            self.tokenizer
                .cache_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".into())
        );
        tracing::info!(
            "  distillation: target={}, loops={}, threshold={}, similarity_chunking={}, context={}, rate_limit={}ms",
            d.target_token_size,
            d.max_distillation_loops,
            d.chunking_threshold,
            d.use_chunking_threshold,
            d.llm_context_length,
            d.llm_api_rate_limit
        );
    }
}

// ── LLM (OpenAI-compatible) ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL including the API version segment, e.g. `https://api.together.xyz/v1`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            base_url: profiled_env_or(p, "LLM_BASE_URL", "https://api.together.xyz/v1"),
            api_key: profiled_env_opt(p, "LLM_API_KEY"),
            model: profiled_env_or(p, "LLM_MODEL", "meta-llama/Llama-3-70b-chat-hf"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    /// Capacity of the in-process embedding LRU cache (entries).
    pub cache_size: usize,
}

impl EmbeddingConfig {
    /// Endpoint and key default to the LLM's, since most hosted providers serve both.
    fn from_env_profiled(p: &str, llm: &LlmConfig) -> Self {
        Self {
            base_url: profiled_env_or(p, "EMBEDDING_BASE_URL", &llm.base_url),
            api_key: profiled_env_opt(p, "EMBEDDING_API_KEY").or_else(|| llm.api_key.clone()),
            batch_size: profiled_env_parse(p, "EMBEDDING_BATCH_SIZE", 64),
            cache_size: profiled_env_parse(p, "EMBEDDING_CACHE_SIZE", 4096),
        }
    }
}

// ── Tokenizer ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Directory holding `{model_id}/tokenizer.json` files.
    pub cache_dir: Option<PathBuf>,
}

impl TokenizerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            cache_dir: profiled_env_opt(p, "TOKENIZER_CACHE_DIR").map(PathBuf::from),
        }
    }
}

// ── Distillation ──────────────────────────────────────────────

/// Per-call options for one distillation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillationConfig {
    /// Desired upper bound on the output token count.
    pub target_token_size: usize,
    /// Hard cap on summarize-and-recombine iterations. Zero returns the input untouched.
    pub max_distillation_loops: usize,
    /// Similarity cutoff in `[0, 1]` for similarity-threshold chunking.
    pub chunking_threshold: f32,
    /// Similarity-threshold chunking when true, fixed-size chunking otherwise.
    pub use_chunking_threshold: bool,
    /// How many following sentences are compared when deciding a split.
    pub similarity_lookahead: usize,
    /// Model context window; the per-chunk budget is derived from it.
    pub llm_context_length: usize,
    /// Milliseconds to wait before every summarization call.
    pub llm_api_rate_limit: u64,
    pub llm_max_gen_length: u32,
    pub llm_temperature: f32,
    pub stop_tokens: Vec<String>,
    pub tokenizer_model: String,
    pub embedding_model: String,
    pub system_prompt: String,
    /// Must contain [`TEXT_PLACEHOLDER`] exactly once.
    pub user_prompt: String,
}

impl Default for DistillationConfig {
    fn default() -> Self {
        Self {
            target_token_size: 2048,
            max_distillation_loops: 5,
            chunking_threshold: 0.25,
            use_chunking_threshold: true,
            similarity_lookahead: 3,
            llm_context_length: 8192,
            llm_api_rate_limit: 500,
            llm_max_gen_length: 2048,
            llm_temperature: 0.1,
            stop_tokens: vec!["<|eot_id|>".to_string()],
            tokenizer_model: DEFAULT_TOKENIZER_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
        }
    }
}

impl DistillationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            target_token_size: profiled_env_parse(p, "TARGET_TOKEN_SIZE", d.target_token_size),
            max_distillation_loops: profiled_env_parse(
                p,
                "MAX_DISTILLATION_LOOPS",
                d.max_distillation_loops,
            ),
            chunking_threshold: profiled_env_parse(p, "CHUNKING_THRESHOLD", d.chunking_threshold),
            use_chunking_threshold: profiled_env_bool(
                p,
                "USE_CHUNKING_THRESHOLD",
                d.use_chunking_threshold,
            ),
            similarity_lookahead: profiled_env_parse(
                p,
                "SIMILARITY_LOOKAHEAD",
                d.similarity_lookahead,
            ),
            llm_context_length: profiled_env_parse(p, "LLM_CONTEXT_LENGTH", d.llm_context_length),
            llm_api_rate_limit: profiled_env_parse(p, "LLM_API_RATE_LIMIT", d.llm_api_rate_limit),
            llm_max_gen_length: profiled_env_parse(p, "LLM_MAX_GEN_LENGTH", d.llm_max_gen_length),
            llm_temperature: profiled_env_parse(p, "LLM_TEMPERATURE", d.llm_temperature),
            stop_tokens: profiled_env_opt(p, "LLM_STOP_TOKENS")
                .map(|raw| parse_stop_tokens(&raw))
                .unwrap_or(d.stop_tokens),
            tokenizer_model: profiled_env_or(p, "DEFAULT_TOKENIZER_MODEL", &d.tokenizer_model),
            embedding_model: profiled_env_or(p, "EMBEDDING_MODEL", &d.embedding_model),
            system_prompt: profiled_env_or(p, "LLM_SYSTEM_PROMPT", &d.system_prompt),
            user_prompt: profiled_env_or(p, "LLM_USER_PROMPT", &d.user_prompt),
        }
    }

    /// Check the invariants every run relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_token_size == 0 {
            return Err(ConfigError::ZeroTargetTokenSize);
        }
        if self.llm_context_length == 0 {
            return Err(ConfigError::ZeroContextLength);
        }
        if !(0.0..=1.0).contains(&self.chunking_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.chunking_threshold));
        }
        let found = self.user_prompt.matches(TEXT_PLACEHOLDER).count();
        if found != 1 {
            return Err(ConfigError::UserPromptPlaceholder {
                placeholder: TEXT_PLACEHOLDER,
                found,
            });
        }
        Ok(())
    }

    /// Similarity at or above which adjacent chunks are merged after splitting.
    /// Looser than the split threshold so chunking favours fewer, larger chunks.
    pub fn combine_threshold(&self) -> f32 {
        (self.chunking_threshold - 0.1).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = DistillationConfig::default();
        assert_eq!(c.target_token_size, 2048);
        assert_eq!(c.max_distillation_loops, 5);
        assert!((c.chunking_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(c.llm_api_rate_limit, 500);
        assert!(c.use_chunking_threshold);
        assert_eq!(c.stop_tokens, vec!["<|eot_id|>".to_string()]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn default_embedding_model_is_served_remotely() {
        let c = DistillationConfig::default();
        assert_eq!(c.embedding_model, "BAAI/bge-base-en-v1.5");
        assert_ne!(c.embedding_model, c.tokenizer_model);
    }

    #[test]
    fn default_prompts_ask_for_summary_json() {
        let c = DistillationConfig::default();
        assert!(c.system_prompt.contains(r#"{"summary": "#));
        assert_eq!(c.user_prompt.matches(TEXT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn validate_rejects_zero_target() {
        let c = DistillationConfig {
            target_token_size: 0,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroTargetTokenSize));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let c = DistillationConfig {
            chunking_threshold: 1.5,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ThresholdOutOfRange(1.5)));
    }

    #[test]
    fn validate_rejects_prompt_without_placeholder() {
        let c = DistillationConfig {
            user_prompt: "summarize this".into(),
            ..Default::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::UserPromptPlaceholder {
                placeholder: TEXT_PLACEHOLDER,
                found: 0
            })
        );
    }

    #[test]
    fn validate_allows_zero_loops() {
        let c = DistillationConfig {
            max_distillation_loops: 0,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn combine_threshold_is_looser_and_never_negative() {
        let c = DistillationConfig {
            chunking_threshold: 0.25,
            ..Default::default()
        };
        assert!((c.combine_threshold() - 0.15).abs() < 1e-6);

        let c = DistillationConfig {
            chunking_threshold: 0.05,
            ..Default::default()
        };
        assert_eq!(c.combine_threshold(), 0.0);
    }

    #[test]
    fn stop_tokens_accept_json_array_or_bare_token() {
        assert_eq!(
            parse_stop_tokens(r#"["<|eot_id|>", "</s>"]"#),
            vec!["<|eot_id|>".to_string(), "</s>".to_string()]
        );
        assert_eq!(parse_stop_tokens("</s>"), vec!["</s>".to_string()]);
        assert!(parse_stop_tokens("  ").is_empty());
    }

    #[test]
    fn partial_json_fills_remaining_defaults() {
        let c: DistillationConfig =
            serde_json::from_str(r#"{"target_token_size": 700, "max_distillation_loops": 10}"#)
                .unwrap();
        assert_eq!(c.target_token_size, 700);
        assert_eq!(c.max_distillation_loops, 10);
        assert_eq!(c.llm_api_rate_limit, 500);
    }

    #[test]
    fn profile_label_defaults() {
        let mut c = Config::for_profile("");
        assert_eq!(c.profile_label(), "default");
        c.profile = "PROD".into();
        assert_eq!(c.profile_label(), "PROD");
    }
}
