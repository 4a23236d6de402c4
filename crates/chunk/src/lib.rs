//! Collaborators consumed by the distillation loop: token counting,
//! sentence embeddings, and text chunking.

pub mod chunker;
pub mod embedding;
pub mod tokenizer;

pub use chunker::{ChunkError, ChunkStrategy, Chunker, SplitOptions, TextChunker};
pub use embedding::{CacheStats, Embedder, EmbeddingCache, EmbeddingError, OpenAiEmbedder};
pub use tokenizer::{HfTokenCounter, TokenCounter, TokenizerError, WhitespaceTokenCounter};
