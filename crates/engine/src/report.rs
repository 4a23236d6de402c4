use serde::Serialize;

/// Outcome of a distillation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistillReport {
    /// The distilled text, or the input when nothing usable was produced.
    pub text: String,
    pub original_token_size: usize,
    pub final_token_size: usize,
    /// Compression loop iterations executed.
    pub loops: usize,
    /// Summarization requests issued, including the forced pass.
    pub summary_calls: usize,
    /// Requests whose result was discarded as empty.
    pub failed_summaries: usize,
    pub forced_compression: bool,
}

impl DistillReport {
    pub(crate) fn unchanged(text: &str, tokens: usize) -> Self {
        Self {
            text: text.to_string(),
            original_token_size: tokens,
            final_token_size: tokens,
            loops: 0,
            summary_calls: 0,
            failed_summaries: 0,
            forced_compression: false,
        }
    }

    /// Final size relative to the original; 1.0 when nothing was measured.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_token_size == 0 {
            1.0
        } else {
            self.final_token_size as f64 / self.original_token_size as f64
        }
    }
}
