//! Synchronous extraction: one API call per chunk, bounded fan-out
//!
//! The direct path trades cost for latency. Chunks run through the chat
//! endpoint with a fixed concurrency cap; a chunk that still fails after the
//! retry budget is counted and skipped, never fatal to the run. Each chunk's
//! rows are upserted as soon as that chunk completes, so a crash mid-run
//! keeps everything finished so far.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::db;
use crate::models::{ChunkWorkItem, RunSummary};
use crate::services::gateway::InferenceGateway;
use crate::services::parser::InsightParser;
use crate::services::prompt;
use crate::services::retry::RetryPolicy;

const PROGRESS_EVERY: usize = 50;

pub struct DirectProcessor<G> {
    gateway: Arc<G>,
    policy: RetryPolicy,
    concurrency: usize,
}

struct RunState {
    parser: InsightParser,
    summary: RunSummary,
    done: usize,
}

impl<G: InferenceGateway> DirectProcessor<G> {
    pub fn new(gateway: Arc<G>, concurrency: usize) -> Self {
        Self {
            gateway,
            policy: RetryPolicy::direct(),
            concurrency: concurrency.max(1),
        }
    }

    #[cfg(test)]
    fn with_policy(gateway: Arc<G>, concurrency: usize, policy: RetryPolicy) -> Self {
        Self { gateway, policy, concurrency: concurrency.max(1) }
    }

    /// Run every chunk through the chat endpoint, upserting each chunk's
    /// validated rows as it completes. The parser is returned so the caller
    /// can persist any features discovered along the way.
    pub async fn process(
        &self,
        items: Vec<ChunkWorkItem>,
        parser: InsightParser,
        model: &str,
        pool: &SqlitePool,
    ) -> (RunSummary, InsightParser) {
        let total = items.len();
        let system_prompt = prompt::build_system_prompt(parser.catalog());
        let schema = prompt::response_format_schema();
        let state = Mutex::new(RunState {
            parser,
            summary: RunSummary {
                chunks: total,
                ..Default::default()
            },
            done: 0,
        });

        tracing::info!(
            chunks = total,
            concurrency = self.concurrency,
            model,
            "Direct extraction starting"
        );

        stream::iter(items)
            .for_each_concurrent(self.concurrency, |item| {
                let state = &state;
                let system_prompt = system_prompt.as_str();
                let schema = &schema;
                async move {
                    let user_prompt =
                        prompt::build_user_prompt(&item.chunk.text, &item.metadata);
                    let result = self
                        .policy
                        .run(
                            || {
                                self.gateway.complete_chunk(
                                    model,
                                    system_prompt,
                                    &user_prompt,
                                    schema,
                                )
                            },
                            |err| err.is_retryable(),
                        )
                        .await;

                    // Parse under the lock, then write to the sink without
                    // holding it; the upsert is idempotent on content hash.
                    let rows = match result {
                        Ok(content) => {
                            let mut guard = state.lock().await;
                            let rows = guard.parser.parse_response(
                                &content,
                                &item.chunk.transcript_id,
                                item.chunk.chunk_index,
                                &item.metadata,
                                model,
                                None,
                            );
                            guard.summary.insights_parsed += rows.len();
                            rows
                        }
                        Err(err) => {
                            let mut guard = state.lock().await;
                            guard.summary.errors += 1;
                            tracing::error!(
                                custom_id = %item.custom_id,
                                error = %err,
                                "Chunk extraction failed, skipping"
                            );
                            Vec::new()
                        }
                    };

                    let inserted = if rows.is_empty() {
                        0
                    } else {
                        match db::insights::upsert_insights(pool, &rows).await {
                            Ok(n) => n as usize,
                            Err(err) => {
                                tracing::error!(
                                    custom_id = %item.custom_id,
                                    error = %err,
                                    "Failed to store chunk insights"
                                );
                                let mut guard = state.lock().await;
                                guard.summary.errors += 1;
                                0
                            }
                        }
                    };

                    let mut guard = state.lock().await;
                    guard.summary.insights_inserted += inserted;
                    guard.done += 1;
                    if guard.done % PROGRESS_EVERY == 0 || guard.done == total {
                        tracing::info!(
                            done = guard.done,
                            total,
                            errors = guard.summary.errors,
                            "Direct extraction progress"
                        );
                    }
                }
            })
            .await;

        let RunState { parser, mut summary, .. } = state.into_inner();
        summary.new_features = parser
            .new_features()
            .iter()
            .map(|f| f.code.clone())
            .collect();
        (summary, parser)
    }
}
