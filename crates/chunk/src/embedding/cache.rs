use std::num::NonZeroUsize;

use lru::LruCache;

/// Lookup counters for an [`EmbeddingCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache; zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Sentence embeddings keyed by `(model, sentence)`, least recently used
/// entries evicted first.
///
/// Distillation loops re-chunk text that often repeats sentences from the
/// previous iteration, so hits are common after the first pass.
pub struct EmbeddingCache {
    entries: LruCache<(String, String), Vec<f32>>,
    stats: CacheStats,
}

impl EmbeddingCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, model: &str, text: &str) -> Option<Vec<f32>> {
        let found = self
            .entries
            .get(&(model.to_owned(), text.to_owned()))
            .cloned();
        match found {
            Some(_) => self.stats.hits += 1,
            None => self.stats.misses += 1,
        }
        found
    }

    pub fn put(&mut self, model: &str, text: &str, embedding: Vec<f32>) {
        self.entries
            .put((model.to_owned(), text.to_owned()), embedding);
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
