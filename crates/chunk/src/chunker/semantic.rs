//! Similarity-threshold strategy.
//!
//! Sentences are embedded and kept together while the next sentence (or one of
//! the `lookahead` sentences after it) stays similar to the chunk being built. The
//! resulting chunks are then merged with similar neighbours at the looser
//! combine threshold, as long as the merged text still fits the budget.

use std::sync::{Mutex, PoisonError};

use super::helpers::{cosine_similarity, fit_to_budget, mean_vector, split_units};
use super::types::{ChunkError, SplitOptions};
use crate::embedding::{Embedder, EmbeddingCache, EmbeddingError};
use crate::tokenizer::TokenCounter;

const THRESHOLD_LOWER_BOUND: f32 = 0.1;
const THRESHOLD_UPPER_BOUND: f32 = 0.9;

struct Group {
    text: String,
    embeddings: Vec<Vec<f32>>,
}

impl Group {
    fn centroid(&self) -> Vec<f32> {
        mean_vector(&self.embeddings)
    }
}

pub(crate) async fn chunk_by_similarity(
    text: &str,
    opts: &SplitOptions,
    counter: &dyn TokenCounter,
    embedder: &dyn Embedder,
    cache: &Mutex<EmbeddingCache>,
    batch_size: usize,
) -> Result<Vec<String>, ChunkError> {
    let max = opts.max_token_size;
    let tokenizer = opts.tokenizer_model.as_str();

    let mut units = Vec::new();
    for sentence in split_units(text) {
        units.extend(fit_to_budget(&sentence, max, counter, tokenizer)?);
    }
    if units.is_empty() {
        return Ok(Vec::new());
    }

    let embeddings = embed_units(&units, &opts.embedding_model, embedder, cache, batch_size).await?;
    let threshold = opts
        .similarity_threshold
        .clamp(THRESHOLD_LOWER_BOUND, THRESHOLD_UPPER_BOUND);

    let mut groups: Vec<Group> = Vec::new();
    for (i, (unit, embedding)) in units.iter().zip(&embeddings).enumerate() {
        if let Some(last) = groups.last_mut() {
            let similarity = lookahead_similarity(&last.centroid(), &embeddings, i, opts.lookahead);
            if similarity >= threshold {
                let candidate = format!("{} {}", last.text, unit);
                if counter.count_tokens(&candidate, tokenizer)? <= max {
                    last.text = candidate;
                    last.embeddings.push(embedding.clone());
                    continue;
                }
            }
        }
        groups.push(Group {
            text: unit.clone(),
            embeddings: vec![embedding.clone()],
        });
    }

    let mut combined: Vec<Group> = Vec::with_capacity(groups.len());
    for group in groups {
        if let Some(last) = combined.last_mut() {
            if cosine_similarity(&last.centroid(), &group.centroid()) >= opts.combine_threshold {
                let candidate = format!("{} {}", last.text, group.text);
                if counter.count_tokens(&candidate, tokenizer)? <= max {
                    last.text = candidate;
                    last.embeddings.extend(group.embeddings);
                    continue;
                }
            }
        }
        combined.push(group);
    }

    Ok(combined.into_iter().map(|g| g.text).collect())
}

/// Highest similarity between the open chunk and the next `lookahead`
/// sentences starting at `i`.
fn lookahead_similarity(centroid: &[f32], embeddings: &[Vec<f32>], i: usize, lookahead: usize) -> f32 {
    let end = (i + lookahead.max(1)).min(embeddings.len());
    embeddings[i..end]
        .iter()
        .map(|e| cosine_similarity(centroid, e))
        .fold(f32::MIN, f32::max)
}

/// Embed every unit, serving repeats from the cache and sending the rest in batches.
async fn embed_units(
    units: &[String],
    model: &str,
    embedder: &dyn Embedder,
    cache: &Mutex<EmbeddingCache>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, ChunkError> {
    let mut out: Vec<Option<Vec<f32>>> = {
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        units.iter().map(|u| cache.get(model, u)).collect()
    };

    let missing: Vec<usize> = (0..units.len()).filter(|&i| out[i].is_none()).collect();
    for batch in missing.chunks(batch_size.max(1)) {
        let texts: Vec<&str> = batch.iter().map(|&i| units[i].as_str()).collect();
        let vectors = embedder.embed_batch(&texts, model).await?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            }
            .into());
        }
        {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            for (&i, vector) in batch.iter().zip(vectors) {
                cache.put(model, &units[i], vector.clone());
                out[i] = Some(vector);
            }
        }
    }

    tracing::debug!(
        units = units.len(),
        embedded = missing.len(),
        cached = units.len() - missing.len(),
        "embedded sentences"
    );
    Ok(out.into_iter().map(Option::unwrap_or_default).collect())
}
