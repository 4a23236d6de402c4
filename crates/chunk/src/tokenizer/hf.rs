use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::registry::is_supported;
use super::{TokenCounter, TokenizerError};

/// Token counter backed by HuggingFace `tokenizer.json` files.
///
/// A tokenizer is resolved from `{cache_dir}/{model_id}/tokenizer.json` when
/// present, otherwise fetched from the HuggingFace hub. Loaded tokenizers are
/// kept for the lifetime of the counter, so repeated calls only pay for encoding.
pub struct HfTokenCounter {
    cache_dir: Option<PathBuf>,
    loaded: RwLock<HashMap<String, Arc<Tokenizer>>>,
}

impl HfTokenCounter {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Load `model_id` now so later counts never block on disk or network.
    /// Blocking; call from `tokio::task::spawn_blocking` in async code.
    pub fn preload(&self, model_id: &str) -> Result<(), TokenizerError> {
        self.tokenizer(model_id).map(|_| ())
    }

    fn tokenizer(&self, model_id: &str) -> Result<Arc<Tokenizer>, TokenizerError> {
        if !is_supported(model_id) {
            return Err(TokenizerError::UnknownModel(model_id.to_string()));
        }

        if let Some(tok) = self
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
        {
            return Ok(Arc::clone(tok));
        }

        let mut tokenizer = self.load(model_id)?;
        // Counts must cover the whole text, not the model's input window.
        tokenizer
            .with_truncation(None)
            .map_err(|e| TokenizerError::Load {
                model: model_id.to_string(),
                reason: e.to_string(),
            })?;
        tokenizer.with_padding(None);

        let tokenizer = Arc::new(tokenizer);
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model_id.to_string(), Arc::clone(&tokenizer));
        Ok(tokenizer)
    }

    fn load(&self, model_id: &str) -> Result<Tokenizer, TokenizerError> {
        let load_err = |e: tokenizers::Error| TokenizerError::Load {
            model: model_id.to_string(),
            reason: e.to_string(),
        };

        if let Some(path) = self.cached_file(model_id) {
            info!(model = model_id, path = %path.display(), "loading tokenizer from cache dir");
            return Tokenizer::from_file(&path).map_err(load_err);
        }

        info!(model = model_id, "fetching tokenizer from the hub");
        Tokenizer::from_pretrained(model_id, None).map_err(load_err)
    }

    fn cached_file(&self, model_id: &str) -> Option<PathBuf> {
        let path = self.cache_dir.as_deref()?.join(Path::new(model_id)).join("tokenizer.json");
        path.is_file().then_some(path)
    }
}

impl TokenCounter for HfTokenCounter {
    fn count_tokens(&self, text: &str, tokenizer_id: &str) -> Result<usize, TokenizerError> {
        let tokenizer = self.tokenizer(tokenizer_id)?;
        if text.is_empty() {
            return Ok(0);
        }
        let encoding = tokenizer
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode {
                model: tokenizer_id.to_string(),
                reason: e.to_string(),
            })?;
        debug!(model = tokenizer_id, chars = text.len(), tokens = encoding.len(), "counted tokens");
        Ok(encoding.len())
    }
}
