//! Asynchronous extraction through the provider's batch API
//!
//! The workload is split into sequential parts of at most
//! `max_requests_per_batch` requests. Each part becomes one JSONL input file:
//! upload, create the batch, persist the batch id, then poll until the job
//! reaches a terminal state. Persisting before polling is what makes a kill
//! mid-poll recoverable; `resume` re-enters the poll loop for the pending id
//! without submitting anything new.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use si_common::{Error, Result};
use sqlx::SqlitePool;

use crate::db;
use crate::models::{
    self, BatchJob, BatchStatus, ChunkMapEntry, ChunkWorkItem, PipelineState, RunSummary,
};
use crate::services::gateway::InferenceGateway;
use crate::services::parser::InsightParser;
use crate::services::prompt;
use crate::services::retry::RetryPolicy;
use crate::services::state::StateStore;

const ERROR_LINES_LOGGED: usize = 10;

pub struct BatchOrchestrator<G> {
    gateway: Arc<G>,
    state: StateStore,
    batch_dir: PathBuf,
    poll_interval: Duration,
    max_requests: usize,
    policy: RetryPolicy,
}

/// One line of the provider's batch output file.
#[derive(Deserialize)]
struct OutputLine {
    custom_id: String,
    #[serde(default)]
    response: Option<LineResponse>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct LineResponse {
    status_code: u16,
    body: ChatBody,
}

#[derive(Deserialize)]
struct ChatBody {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl<G: InferenceGateway> BatchOrchestrator<G> {
    pub fn new(
        gateway: Arc<G>,
        state: StateStore,
        batch_dir: PathBuf,
        poll_interval: Duration,
        max_requests: usize,
    ) -> Self {
        Self {
            gateway,
            state,
            batch_dir,
            poll_interval,
            max_requests: max_requests.max(1),
            policy: RetryPolicy::direct(),
        }
    }

    /// Submit the whole workload and drive every part to completion.
    pub async fn run(
        &self,
        items: Vec<ChunkWorkItem>,
        parser: &mut InsightParser,
        model: &str,
        pool: &SqlitePool,
    ) -> Result<RunSummary> {
        let chunk_map = models::transcript::chunk_map(&items);
        self.state.save_chunk_map(&chunk_map)?;

        let parts: Vec<&[ChunkWorkItem]> = items.chunks(self.max_requests).collect();
        let total_parts = parts.len();
        let mut summary = RunSummary {
            chunks: items.len(),
            ..Default::default()
        };

        tracing::info!(
            chunks = items.len(),
            parts = total_parts,
            max_per_batch = self.max_requests,
            model,
            "Batch extraction starting"
        );

        let system_prompt = prompt::build_system_prompt(parser.catalog());
        let mut last_batch_id = String::new();
        for (index, part) in parts.iter().enumerate() {
            let part_no = index + 1;
            let job = self
                .submit_part(part, part_no, total_parts, model, &system_prompt)
                .await?;
            last_batch_id = job.id.clone();

            let job = self.poll_until_terminal(&job.id).await?;
            let part_summary = self
                .ingest(&job, parser, &chunk_map, model, pool)
                .await?;
            summary.merge(&part_summary);
        }

        self.finish_run(&last_batch_id, parser, pool, &mut summary)
            .await?;
        Ok(summary)
    }

    /// Pick up a run that was killed while a batch was in flight. Returns
    /// None when nothing is pending.
    pub async fn resume(
        &self,
        parser: &mut InsightParser,
        model: &str,
        pool: &SqlitePool,
    ) -> Result<Option<RunSummary>> {
        let state = self.state.load();
        let Some(batch_id) = state.pending_batch_id else {
            tracing::info!("No pending batch to resume");
            return Ok(None);
        };
        let chunk_map = self.state.load_chunk_map()?;
        // Prefer the model the batch was actually submitted with.
        let model = state.model.as_deref().unwrap_or(model);
        tracing::info!(
            batch_id,
            part = state.part_index.unwrap_or(1),
            parts = state.total_parts.unwrap_or(1),
            "Resuming pending batch"
        );

        let job = self.poll_until_terminal(&batch_id).await?;
        let mut summary = self.ingest(&job, parser, &chunk_map, model, pool).await?;
        self.finish_run(&batch_id, parser, pool, &mut summary).await?;
        Ok(Some(summary))
    }

    /// Current provider-side state of the pending batch, if any.
    pub async fn status(&self) -> Result<Option<BatchJob>> {
        let state = self.state.load();
        let Some(batch_id) = state.pending_batch_id else {
            return Ok(None);
        };
        let job = self.gateway_call(|| self.gateway.get_batch(&batch_id)).await?;
        Ok(Some(job))
    }

    async fn submit_part(
        &self,
        part: &[ChunkWorkItem],
        part_no: usize,
        total_parts: usize,
        model: &str,
        system_prompt: &str,
    ) -> Result<BatchJob> {
        let schema = prompt::response_format_schema();
        let body = part_body(part, model, system_prompt, &schema)?;

        let file_name = format!("batch_input_part_{part_no}.jsonl");
        std::fs::create_dir_all(&self.batch_dir)?;
        std::fs::write(self.batch_dir.join(&file_name), &body)?;

        let file_id = self
            .gateway_call(|| self.gateway.upload_batch_file(&file_name, body.clone()))
            .await?;
        let job = self
            .gateway_call(|| self.gateway.create_batch(&file_id))
            .await?;

        // State hits disk before the first poll so a crash here is resumable.
        self.state.save(&PipelineState {
            pending_batch_id: Some(job.id.clone()),
            part_index: Some(part_no),
            total_parts: Some(total_parts),
            model: Some(model.to_string()),
            chunk_map_path: Some(
                self.state
                    .path()
                    .with_extension("chunks.json")
                    .display()
                    .to_string(),
            ),
            started_at: Some(chrono::Utc::now()),
            ..Default::default()
        })?;

        tracing::info!(
            batch_id = %job.id,
            part = part_no,
            parts = total_parts,
            requests = part.len(),
            "Batch submitted"
        );
        Ok(job)
    }

    async fn poll_until_terminal(&self, batch_id: &str) -> Result<BatchJob> {
        loop {
            let job = self
                .gateway_call(|| self.gateway.get_batch(batch_id))
                .await?;
            if job.status.is_terminal() {
                tracing::info!(
                    batch_id,
                    status = job.status.as_str(),
                    completed = job.completed,
                    failed = job.failed,
                    "Batch reached terminal state"
                );
                return Ok(job);
            }
            tracing::info!(
                batch_id,
                completed = job.completed,
                failed = job.failed,
                total = job.total,
                "Batch in progress"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Pull results for a terminal batch into the database. A batch that
    /// ended failed/expired/cancelled contributes errors, not a run abort.
    async fn ingest(
        &self,
        job: &BatchJob,
        parser: &mut InsightParser,
        chunk_map: &HashMap<String, ChunkMapEntry>,
        model: &str,
        pool: &SqlitePool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if job.status != BatchStatus::Completed {
            summary.errors += job.total.max(job.failed) as usize;
            tracing::error!(
                batch_id = %job.id,
                status = job.status.as_str(),
                failed = job.failed,
                "Batch did not complete, skipping its requests"
            );
            self.log_error_file(job).await;
            return Ok(summary);
        }

        let Some(output_file_id) = job.output_file_id.as_deref() else {
            return Err(Error::Internal(format!(
                "completed batch {} has no output file",
                job.id
            )));
        };
        let output = self
            .gateway_call(|| self.gateway.download_file(output_file_id))
            .await?;

        let mut rows = Vec::new();
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            let parsed: OutputLine = match serde_json::from_str(line) {
                Ok(parsed) => parsed,
                Err(err) => {
                    summary.errors += 1;
                    tracing::warn!(error = %err, "Skipping unparseable batch output line");
                    continue;
                }
            };

            let Some(entry) = chunk_map.get(&parsed.custom_id) else {
                summary.errors += 1;
                tracing::warn!(custom_id = %parsed.custom_id, "Output line has no chunk map entry");
                continue;
            };

            let content = match parsed.response {
                Some(response) if response.status_code == 200 => response
                    .body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content),
                Some(response) => {
                    summary.errors += 1;
                    tracing::warn!(
                        custom_id = %parsed.custom_id,
                        status_code = response.status_code,
                        "Request inside batch failed"
                    );
                    continue;
                }
                None => {
                    summary.errors += 1;
                    tracing::warn!(
                        custom_id = %parsed.custom_id,
                        error = ?parsed.error,
                        "Request inside batch returned an error"
                    );
                    continue;
                }
            };

            let Some(content) = content else {
                summary.errors += 1;
                continue;
            };

            let chunk_rows = parser.parse_response(
                &content,
                &entry.transcript_id,
                entry.chunk_index,
                &entry.metadata,
                model,
                Some(&job.id),
            );
            summary.insights_parsed += chunk_rows.len();
            rows.extend(chunk_rows);
        }

        summary.insights_inserted += db::insights::upsert_insights(pool, &rows).await? as usize;
        tracing::info!(
            batch_id = %job.id,
            parsed = summary.insights_parsed,
            inserted = summary.insights_inserted,
            errors = summary.errors,
            "Batch ingested"
        );
        Ok(summary)
    }

    async fn log_error_file(&self, job: &BatchJob) {
        let Some(error_file_id) = job.error_file_id.as_deref() else {
            return;
        };
        match self
            .gateway_call(|| self.gateway.download_file(error_file_id))
            .await
        {
            Ok(contents) => {
                for line in contents.lines().take(ERROR_LINES_LOGGED) {
                    tracing::error!(batch_id = %job.id, "batch error: {line}");
                }
            }
            Err(err) => {
                tracing::warn!(batch_id = %job.id, error = %err, "Could not download error file");
            }
        }
    }

    async fn finish_run(
        &self,
        batch_id: &str,
        parser: &InsightParser,
        pool: &SqlitePool,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for feature in parser.new_features() {
            db::taxonomy::register_feature(pool, feature).await?;
            if !summary.new_features.contains(&feature.code) {
                summary.new_features.push(feature.code.clone());
            }
        }
        self.state.save(&PipelineState::completed(batch_id))?;
        Ok(())
    }

    async fn gateway_call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, crate::services::gateway::GatewayError>>,
    {
        self.policy
            .run(op, |err| err.is_retryable())
            .await
            .map_err(|err| Error::Gateway(err.to_string()))
    }
}

/// Write the JSONL input files a run would submit, without submitting them.
/// Returns the paths written.
pub fn write_batch_inputs(
    batch_dir: &std::path::Path,
    items: &[ChunkWorkItem],
    model: &str,
    system_prompt: &str,
    max_requests: usize,
) -> Result<Vec<PathBuf>> {
    let schema = prompt::response_format_schema();
    std::fs::create_dir_all(batch_dir)?;

    let mut paths = Vec::new();
    for (index, part) in items.chunks(max_requests.max(1)).enumerate() {
        let body = part_body(part, model, system_prompt, &schema)?;
        let path = batch_dir.join(format!("batch_input_part_{}.jsonl", index + 1));
        std::fs::write(&path, body)?;
        paths.push(path);
    }
    Ok(paths)
}

fn part_body(
    part: &[ChunkWorkItem],
    model: &str,
    system_prompt: &str,
    schema: &serde_json::Value,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    for item in part {
        let line = request_line(item, model, system_prompt, schema)?;
        body.extend_from_slice(line.as_bytes());
        body.push(b'\n');
    }
    Ok(body)
}

/// One JSONL request line in the provider's batch input format.
fn request_line(
    item: &ChunkWorkItem,
    model: &str,
    system_prompt: &str,
    schema: &serde_json::Value,
) -> Result<String> {
    let line = serde_json::json!({
        "custom_id": item.custom_id,
        "method": "POST",
        "url": "/v1/chat/completions",
        "body": {
            "model": model,
            "temperature": 0,
            "response_format": schema,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt::build_user_prompt(&item.chunk.text, &item.metadata) },
            ],
        },
    });
    serde_json::to_string(&line).map_err(|e| Error::Internal(format!("request serialization: {e}")))
}
