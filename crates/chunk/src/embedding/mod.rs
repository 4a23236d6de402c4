pub mod cache;
pub mod openai;
pub mod traits;

pub use cache::{CacheStats, EmbeddingCache};
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};
