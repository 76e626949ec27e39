//! End-to-end pipeline driver: fetch, chunk, extract, load
//!
//! Mode selection follows the run options: a sample cap routes through the
//! direct chat API, dry run writes the batch input files and stops, and the
//! default path goes through the asynchronous batch API.

use std::sync::Arc;
use std::time::Duration;

use si_common::{PipelineConfig, Result, TaxonomyCatalog};
use sqlx::SqlitePool;

use crate::db;
use crate::models::{ChunkWorkItem, PipelineState, RunSummary};
use crate::services::batch::{self, BatchOrchestrator};
use crate::services::chunker::Chunker;
use crate::services::direct::DirectProcessor;
use crate::services::gateway::OpenAiGateway;
use crate::services::parser::InsightParser;
use crate::services::prompt;
use crate::services::state::StateStore;

/// Marker recorded in the state file after a direct-mode run finishes.
const DIRECT_RUN_MARKER: &str = "direct_api";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Process only the N most recent transcripts, via the direct API.
    pub sample: Option<u32>,
    pub model: Option<String>,
    /// Write the batch input files without submitting anything.
    pub dry_run: bool,
    /// Pick up a previously submitted batch instead of starting fresh.
    pub resume: bool,
    /// Reprocess transcripts that already have insights for this prompt
    /// version.
    pub force: bool,
}

pub async fn run(config: &PipelineConfig, opts: RunOptions) -> Result<RunSummary> {
    let pool = db::init_database(&config.database_path()).await?;
    let model = opts.model.as_deref().unwrap_or(&config.model);

    let mut parser = build_parser(&pool, config).await?;

    if opts.resume {
        let orchestrator = orchestrator(config)?;
        return match orchestrator.resume(&mut parser, model, &pool).await? {
            Some(summary) => Ok(summary),
            None => Ok(RunSummary::default()),
        };
    }

    let items = collect_work(&pool, config, &opts).await?;
    if items.is_empty() {
        tracing::info!("Nothing to process");
        return Ok(RunSummary::default());
    }
    let transcript_count = items
        .iter()
        .map(|item| item.chunk.transcript_id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    if opts.dry_run {
        let system_prompt = prompt::build_system_prompt(parser.catalog());
        let paths = batch::write_batch_inputs(
            &config.batch_dir(),
            &items,
            model,
            &system_prompt,
            config.max_requests_per_batch,
        )?;
        for path in &paths {
            tracing::info!(path = %path.display(), "Dry run: wrote batch input");
        }
        return Ok(RunSummary {
            transcripts: transcript_count,
            chunks: items.len(),
            ..Default::default()
        });
    }

    if opts.sample.is_some() {
        let gateway = Arc::new(OpenAiGateway::new(
            config.require_api_key()?,
            &config.openai_base_url,
        )?);
        let processor = DirectProcessor::new(gateway, config.direct_concurrency);
        let (mut summary, parser) = processor.process(items, parser, model, &pool).await;
        summary.transcripts = transcript_count;
        for feature in parser.new_features() {
            db::taxonomy::register_feature(&pool, feature).await?;
        }
        let store = StateStore::new(config.state_file_path());
        store.save(&PipelineState::completed(DIRECT_RUN_MARKER))?;
        log_summary(&summary);
        return Ok(summary);
    }

    let orchestrator = orchestrator(config)?;
    let mut summary = orchestrator.run(items, &mut parser, model, &pool).await?;
    summary.transcripts = transcript_count;
    log_summary(&summary);
    Ok(summary)
}

/// Provider-side status of the pending batch, for the `status` command.
/// Checks local state first so a clean state needs no API key.
pub async fn batch_status(
    config: &PipelineConfig,
) -> Result<Option<crate::models::BatchJob>> {
    let store = StateStore::new(config.state_file_path());
    if !store.load().has_pending() {
        return Ok(None);
    }
    orchestrator(config)?.status().await
}

/// Stored insight counts per type, for the `status` command.
pub async fn stored_insight_counts(config: &PipelineConfig) -> Result<Vec<(String, i64)>> {
    let pool = db::init_database(&config.database_path()).await?;
    db::insights::insight_counts(&pool).await
}

/// Create the schema and write the seed taxonomy.
pub async fn seed(config: &PipelineConfig) -> Result<u64> {
    let pool = db::init_database(&config.database_path()).await?;
    let written = db::taxonomy::seed_features(&pool, &TaxonomyCatalog::seed()).await?;
    tracing::info!(written, "Taxonomy seeded");
    Ok(written)
}

fn orchestrator(config: &PipelineConfig) -> Result<BatchOrchestrator<OpenAiGateway>> {
    let gateway = Arc::new(OpenAiGateway::new(
        config.require_api_key()?,
        &config.openai_base_url,
    )?);
    Ok(BatchOrchestrator::new(
        gateway,
        StateStore::new(config.state_file_path()),
        config.batch_dir(),
        Duration::from_secs(config.batch_poll_interval_secs),
        config.max_requests_per_batch,
    ))
}

async fn build_parser(pool: &SqlitePool, config: &PipelineConfig) -> Result<InsightParser> {
    let mut catalog = TaxonomyCatalog::seed();
    db::taxonomy::seed_features(pool, &catalog).await?;
    let discovered = db::taxonomy::load_discovered_features(pool, &mut catalog).await?;
    if discovered > 0 {
        tracing::info!(discovered, "Loaded previously discovered feature codes");
    }
    Ok(InsightParser::new(catalog, &config.prompt_version))
}

/// Fetch, filter, deduplicate and chunk the transcripts to process.
async fn collect_work(
    pool: &SqlitePool,
    config: &PipelineConfig,
    opts: &RunOptions,
) -> Result<Vec<ChunkWorkItem>> {
    let mut transcripts = db::transcripts::fetch_transcripts(pool, opts.sample).await?;
    tracing::info!(count = transcripts.len(), "Fetched transcripts");

    if opts.force {
        tracing::info!("Force mode: skipping already-processed filter");
    } else if opts.sample.is_none() {
        let processed =
            db::transcripts::processed_transcript_ids(pool, &config.prompt_version).await?;
        let before = transcripts.len();
        transcripts.retain(|t| !processed.contains(&t.transcript_id));
        tracing::info!(
            before,
            after = transcripts.len(),
            prompt_version = %config.prompt_version,
            "Filtered already-processed transcripts"
        );
    }

    // The source view can return duplicates; keep the first of each id.
    let mut seen = std::collections::HashSet::new();
    transcripts.retain(|t| seen.insert(t.transcript_id.clone()));

    let chunker = Chunker::new()?;
    let mut items = Vec::new();
    for transcript in &transcripts {
        if transcript.transcript_text.trim().is_empty() {
            tracing::warn!(transcript_id = %transcript.transcript_id, "Empty transcript, skipping");
            continue;
        }
        let metadata = transcript.crm_context();
        let chunks = chunker.chunk(
            &transcript.transcript_id,
            &transcript.transcript_text,
            config.max_tokens_per_chunk,
        );
        for chunk in chunks {
            items.push(ChunkWorkItem::new(chunk, metadata.clone()));
        }
    }
    tracing::info!(chunks = items.len(), "Chunking complete");
    Ok(items)
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        transcripts = summary.transcripts,
        chunks = summary.chunks,
        parsed = summary.insights_parsed,
        inserted = summary.insights_inserted,
        errors = summary.errors,
        "Pipeline run complete"
    );
    if !summary.new_features.is_empty() {
        tracing::info!(features = ?summary.new_features, "New feature codes discovered");
    }
}
