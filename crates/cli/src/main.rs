mod cli;
mod io;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use distillery_chunk::{HfTokenCounter, OpenAiEmbedder, TextChunker, TokenCounter};
use distillery_core::{load_dotenv, Config};
use distillery_engine::Distiller;
use distillery_llm::providers::create_provider;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    // Initialize tracing; logs go to stderr so stdout stays clean for the result
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let mut config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    args.apply(&mut config);
    config.log_summary();
    config
        .distillation
        .validate()
        .context("invalid distillation settings")?;
    if !config.llm.is_configured() {
        warn!(base_url = %config.llm.base_url, "no LLM API key configured, sending unauthenticated requests");
    }

    let input = io::read_input(args.input.as_deref())?;

    let tokenizer = Arc::new(HfTokenCounter::new(config.tokenizer.cache_dir.clone()));
    {
        let tokenizer = Arc::clone(&tokenizer);
        let model = config.distillation.tokenizer_model.clone();
        tokio::task::spawn_blocking(move || tokenizer.preload(&model))
            .await
            .context("tokenizer loader panicked")?
            .context("failed to load tokenizer")?;
    }
    let counter: Arc<dyn TokenCounter> = tokenizer;
    let mut chunker = TextChunker::new(Arc::clone(&counter))
        .with_cache_capacity(config.embedding.cache_size)
        .with_batch_size(config.embedding.batch_size);
    if config.distillation.use_chunking_threshold {
        chunker = chunker.with_embedder(Arc::new(OpenAiEmbedder::new(
            config.embedding.api_key.clone(),
            config.embedding.base_url.clone(),
        )));
    }
    let client = create_provider(&config.llm);
    let distiller = Distiller::new(counter, Arc::new(chunker), client);

    let report = distiller
        .distill_with_report(&input, &config.distillation)
        .await
        .context("distillation failed")?;
    info!(
        loops = report.loops,
        calls = report.summary_calls,
        failed = report.failed_summaries,
        "run complete"
    );

    io::write_output(args.output.as_deref(), &report.text)?;

    if args.stats {
        let stats = serde_json::json!({
            "original_token_size": report.original_token_size,
            "final_token_size": report.final_token_size,
            "compression_ratio": report.compression_ratio(),
            "loops": report.loops,
            "summary_calls": report.summary_calls,
            "failed_summaries": report.failed_summaries,
            "forced_compression": report.forced_compression,
        });
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
