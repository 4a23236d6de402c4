pub mod config;
pub mod error;

pub use config::{
    load_dotenv, Config, DistillationConfig, EmbeddingConfig, LlmConfig, TokenizerConfig,
    TEXT_PLACEHOLDER,
};
pub use error::ConfigError;
