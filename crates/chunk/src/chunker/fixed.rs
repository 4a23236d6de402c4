//! Fixed-size strategy: sentences packed densely up to the token budget.

use super::helpers::{fit_to_budget, pack, split_units};
use super::types::{ChunkError, SplitOptions};
use crate::tokenizer::TokenCounter;

pub(crate) fn chunk_fixed(
    text: &str,
    opts: &SplitOptions,
    counter: &dyn TokenCounter,
) -> Result<Vec<String>, ChunkError> {
    let mut pieces = Vec::new();
    for unit in split_units(text) {
        pieces.extend(fit_to_budget(
            &unit,
            opts.max_token_size,
            counter,
            &opts.tokenizer_model,
        )?);
    }
    Ok(pack(pieces, opts.max_token_size, counter, &opts.tokenizer_model)?)
}
