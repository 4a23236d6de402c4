//! Text splitting and packing utilities used by chunking strategies.

use crate::tokenizer::{TokenCounter, TokenizerError};

/// Split `text` at sentence boundaries (`. `, `! `, `? ` followed by uppercase
/// or newline). Returns non-empty fragments.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        let is_terminal = bytes[i] == b'.' || bytes[i] == b'!' || bytes[i] == b'?';
        if is_terminal && i + 1 < bytes.len() && bytes[i + 1] == b' ' {
            let after_space = if i + 2 < bytes.len() {
                bytes[i + 2]
            } else {
                b'\n' // end-of-string acts like newline
            };
            if after_space.is_ascii_uppercase() || after_space == b'\n' {
                let end = i + 1; // include the terminal punctuation
                let s = text[start..end].trim();
                if !s.is_empty() {
                    sentences.push(s.to_string());
                }
                start = end + 1; // skip the space
                i = start;
                continue;
            }
        }
        i += 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Paragraphs (`\n\n`) split into sentences, in document order.
pub(crate) fn split_units(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(split_sentences)
        .collect()
}

/// Break `piece` into parts that each fit `max_tokens`: by words first, then by
/// characters for a single word that is still too large. A lone character over
/// budget is emitted as-is since it cannot be split further.
pub(crate) fn fit_to_budget(
    piece: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    tokenizer_id: &str,
) -> Result<Vec<String>, TokenizerError> {
    if counter.count_tokens(piece, tokenizer_id)? <= max_tokens {
        return Ok(vec![piece.to_string()]);
    }

    let mut parts = Vec::new();
    for word in piece.split_whitespace() {
        if counter.count_tokens(word, tokenizer_id)? <= max_tokens {
            parts.push(word.to_string());
        } else {
            parts.extend(split_chars(word, max_tokens, counter, tokenizer_id)?);
        }
    }
    pack(parts, max_tokens, counter, tokenizer_id)
}

fn split_chars(
    word: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    tokenizer_id: &str,
) -> Result<Vec<String>, TokenizerError> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    for ch in word.chars() {
        buf.push(ch);
        if buf.chars().count() > 1 && counter.count_tokens(&buf, tokenizer_id)? > max_tokens {
            buf.pop();
            parts.push(std::mem::take(&mut buf));
            buf.push(ch);
        }
    }
    if !buf.is_empty() {
        parts.push(buf);
    }
    Ok(parts)
}

/// Greedily join adjacent `pieces` with a space while the joined text stays
/// within `max_tokens`. Order is preserved.
pub(crate) fn pack(
    pieces: Vec<String>,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    tokenizer_id: &str,
) -> Result<Vec<String>, TokenizerError> {
    let mut packed: Vec<String> = Vec::new();
    let mut buf = String::new();
    for piece in pieces {
        if buf.is_empty() {
            buf = piece;
            continue;
        }
        let candidate = format!("{buf} {piece}");
        if counter.count_tokens(&candidate, tokenizer_id)? <= max_tokens {
            buf = candidate;
        } else {
            packed.push(std::mem::replace(&mut buf, piece));
        }
    }
    if !buf.is_empty() {
        packed.push(buf);
    }
    Ok(packed)
}

/// Cosine similarity; zero when either vector has no magnitude or lengths differ.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Element-wise mean of a set of equally sized vectors.
pub(crate) fn mean_vector<'a>(vectors: impl IntoIterator<Item = &'a Vec<f32>>) -> Vec<f32> {
    let mut sum: Vec<f32> = Vec::new();
    let mut n = 0usize;
    for v in vectors {
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        }
        for (s, x) in sum.iter_mut().zip(v) {
            *s += x;
        }
        n += 1;
    }
    if n > 1 {
        for s in &mut sum {
            *s /= n as f32;
        }
    }
    sum
}
