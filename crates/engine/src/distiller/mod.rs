//! The compression loop.

use std::sync::Arc;
use std::time::Duration;

use distillery_chunk::{ChunkStrategy, Chunker, SplitOptions, TokenCounter};
use distillery_core::DistillationConfig;
use distillery_llm::{Message, SummarizationClient};
use tracing::{debug, info, warn};

use crate::error::{DistillError, SummaryError};
use crate::payload::parse_summary_payload;
use crate::prompt::{chunk_messages, chunking_token_size, completion_params, forced_messages};
use crate::report::DistillReport;


/// Texts at or above this many tokens never get the forced pass; a single
/// request over them is unlikely to summarize well.
pub const FORCED_COMPRESSION_CEILING: usize = 1024;

/// Per-run loop state. Owned by one `distill` call.
struct DistillationState {
    current_text: String,
    last_measured: usize,
    loop_index: usize,
    summary_calls: usize,
    failed_summaries: usize,
}

/// Drives chunking and summarization until the text fits the target size.
///
/// Collaborators are shared so one distiller can serve concurrent runs; each
/// run keeps its own state.
pub struct Distiller {
    counter: Arc<dyn TokenCounter>,
    chunker: Arc<dyn Chunker>,
    client: Arc<dyn SummarizationClient>,
}

impl Distiller {
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        chunker: Arc<dyn Chunker>,
        client: Arc<dyn SummarizationClient>,
    ) -> Self {
        Self {
            counter,
            chunker,
            client,
        }
    }

    /// Compress `text` toward `config.target_token_size`.
    ///
    /// Failed summarizations degrade to empty strings and never abort the run.
    /// If nothing usable is produced the input is returned unchanged.
    pub async fn distill(
        &self,
        text: &str,
        config: &DistillationConfig,
    ) -> Result<String, DistillError> {
        Ok(self.distill_with_report(text, config).await?.text)
    }

    /// Like [`Distiller::distill`], also reporting sizes and call counts.
    pub async fn distill_with_report(
        &self,
        text: &str,
        config: &DistillationConfig,
    ) -> Result<DistillReport, DistillError> {
        config.validate()?;
        if text.trim().is_empty() {
            return Ok(DistillReport::unchanged(text, 0));
        }

        let original = self.count(text, config)?;
        info!(
            tokens = original,
            target = config.target_token_size,
            "starting distillation"
        );
        if original <= config.target_token_size || config.max_distillation_loops == 0 {
            return Ok(DistillReport::unchanged(text, original));
        }

        let opts = split_options(config)?;
        let mut state = DistillationState {
            current_text: text.to_string(),
            last_measured: original,
            loop_index: 0,
            summary_calls: 0,
            failed_summaries: 0,
        };

        let mut ended_blank = false;
        while state.loop_index < config.max_distillation_loops
            && state.last_measured > config.target_token_size
        {
            state.loop_index += 1;
            let chunks = self.chunker.split(&state.current_text, &opts).await?;
            info!(
                iteration = state.loop_index,
                max_loops = config.max_distillation_loops,
                chunks = chunks.len(),
                "compression loop"
            );

            let mut summaries = Vec::with_capacity(chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                debug!(chunk = i, chars = chunk.len(), "summarizing chunk");
                let summary = self
                    .summarize(chunk_messages(config, chunk), config, &mut state)
                    .await;
                summaries.push(summary);
            }

            let recombined = summaries.join(" ");
            if recombined.trim().is_empty() {
                warn!(
                    iteration = state.loop_index,
                    "no chunk produced a summary, keeping previous text"
                );
                ended_blank = true;
                break;
            }
            state.last_measured = self.count(&recombined, config)?;
            state.current_text = recombined;
            info!(
                iteration = state.loop_index,
                tokens = state.last_measured,
                "loop finished"
            );
        }

        // Only loop output is refined; a blank iteration ends the run as is.
        let mut forced_compression = false;
        if !ended_blank
            && state.last_measured > config.target_token_size
            && state.last_measured < FORCED_COMPRESSION_CEILING
        {
            info!(
                tokens = state.last_measured,
                target = config.target_token_size,
                "forcing final compression"
            );
            let messages = forced_messages(config, &state.current_text);
            let summary = self.summarize(messages, config, &mut state).await;
            if summary.trim().is_empty() {
                warn!("forced compression produced nothing, keeping loop output");
            } else {
                state.last_measured = self.count(&summary, config)?;
                state.current_text = summary;
                forced_compression = true;
            }
        }

        let report = DistillReport {
            text: state.current_text,
            original_token_size: original,
            final_token_size: state.last_measured,
            loops: state.loop_index,
            summary_calls: state.summary_calls,
            failed_summaries: state.failed_summaries,
            forced_compression,
        };
        info!(
            original = report.original_token_size,
            distilled = report.final_token_size,
            ratio = format!("{:.1}%", report.compression_ratio() * 100.0),
            "distillation finished"
        );
        Ok(report)
    }

    fn count(&self, text: &str, config: &DistillationConfig) -> Result<usize, DistillError> {
        Ok(self.counter.count_tokens(text, &config.tokenizer_model)?)
    }

    /// One rate-limited summarization. Any failure yields an empty string.
    async fn summarize(
        &self,
        messages: Vec<Message>,
        config: &DistillationConfig,
        state: &mut DistillationState,
    ) -> String {
        tokio::time::sleep(Duration::from_millis(config.llm_api_rate_limit)).await;
        state.summary_calls += 1;
        match self.request_summary(messages, config).await {
            Ok(summary) => {
                if summary.trim().is_empty() {
                    state.failed_summaries += 1;
                }
                summary
            }
            Err(e) => {
                warn!(error = %e, "discarding summary");
                state.failed_summaries += 1;
                String::new()
            }
        }
    }

    async fn request_summary(
        &self,
        messages: Vec<Message>,
        config: &DistillationConfig,
    ) -> Result<String, SummaryError> {
        let raw = self
            .client
            .summarize(messages, &completion_params(config))
            .await?;
        debug!(chars = raw.len(), "received completion");
        Ok(parse_summary_payload(&raw)?)
    }
}

fn split_options(config: &DistillationConfig) -> Result<SplitOptions, DistillError> {
    let strategy = if config.use_chunking_threshold {
        ChunkStrategy::Similarity
    } else {
        ChunkStrategy::FixedSize
    };
    Ok(SplitOptions {
        strategy,
        max_token_size: chunking_token_size(config)?,
        similarity_threshold: config.chunking_threshold,
        combine_threshold: config.combine_threshold(),
        lookahead: config.similarity_lookahead,
        tokenizer_model: config.tokenizer_model.clone(),
        embedding_model: config.embedding_model.clone(),
    })
}
