//! Batch submit, poll, resume and ingest against a scripted gateway.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

use si_common::TaxonomyCatalog;
use si_pipeline::db;
use si_pipeline::models::{
    BatchJob, BatchStatus, Chunk, ChunkWorkItem, CrmContext, PipelineState,
};
use si_pipeline::services::batch::{write_batch_inputs, BatchOrchestrator};
use si_pipeline::services::gateway::{GatewayError, InferenceGateway};
use si_pipeline::services::parser::InsightParser;
use si_pipeline::services::state::StateStore;

#[derive(Default)]
struct MockGateway {
    uploads: Mutex<Vec<(String, usize)>>,
    created: Mutex<Vec<String>>,
    /// Successive answers for get_batch; the last one repeats.
    statuses: Mutex<VecDeque<BatchJob>>,
    files: Mutex<HashMap<String, String>>,
}

impl MockGateway {
    fn push_status(&self, job: BatchJob) {
        self.statuses.lock().unwrap().push_back(job);
    }

    fn set_file(&self, id: &str, content: String) {
        self.files.lock().unwrap().insert(id.to_string(), content);
    }
}

fn job(id: &str, status: BatchStatus, output: Option<&str>) -> BatchJob {
    BatchJob {
        id: id.to_string(),
        status,
        total: 2,
        completed: if status == BatchStatus::Completed { 2 } else { 0 },
        failed: 0,
        output_file_id: output.map(String::from),
        error_file_id: None,
    }
}

impl InferenceGateway for MockGateway {
    async fn complete_chunk(
        &self,
        _model: &str,
        _system: &str,
        _user: &str,
        _format: &Value,
    ) -> Result<String, GatewayError> {
        unimplemented!("batch tests never hit the chat endpoint")
    }

    async fn upload_batch_file(
        &self,
        file_name: &str,
        jsonl_body: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let lines = jsonl_body.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();
        self.uploads.lock().unwrap().push((file_name.to_string(), lines));
        Ok(format!("file_{file_name}"))
    }

    async fn create_batch(&self, input_file_id: &str) -> Result<BatchJob, GatewayError> {
        self.created.lock().unwrap().push(input_file_id.to_string());
        Ok(job("batch_1", BatchStatus::Pending, None))
    }

    async fn get_batch(&self, batch_id: &str) -> Result<BatchJob, GatewayError> {
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.ok_or_else(|| GatewayError::InvalidResponse(format!("no status for {batch_id}")))
    }

    async fn download_file(&self, file_id: &str) -> Result<String, GatewayError> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("unknown file {file_id}")))
    }
}

fn work_item(tid: &str, index: u32) -> ChunkWorkItem {
    ChunkWorkItem::new(
        Chunk {
            transcript_id: tid.to_string(),
            chunk_index: index,
            text: format!("Alice: chunk {index} of {tid}"),
            token_count: 8,
        },
        CrmContext::default(),
    )
}

fn pain_response(summary: &str) -> String {
    serde_json::json!({
        "insights": [{
            "insight_type": "pain",
            "insight_subtype": "manual_processes",
            "summary": summary,
            "confidence": 0.9,
        }]
    })
    .to_string()
}

fn output_line(custom_id: &str, summary: &str) -> String {
    serde_json::json!({
        "custom_id": custom_id,
        "response": {
            "status_code": 200,
            "body": {
                "choices": [{ "message": { "content": pain_response(summary) } }]
            }
        },
        "error": null,
    })
    .to_string()
}

fn orchestrator(gateway: Arc<MockGateway>, dir: &TempDir) -> BatchOrchestrator<MockGateway> {
    BatchOrchestrator::new(
        gateway,
        StateStore::new(dir.path().join("state.json")),
        dir.path().join("batches"),
        Duration::from_millis(1),
        2000,
    )
}

async fn test_pool(dir: &TempDir) -> SqlitePool {
    db::init_database(&dir.path().join("insights.db")).await.unwrap()
}

async fn insight_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transcript_insights")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn run_submits_polls_and_ingests() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let gateway = Arc::new(MockGateway::default());

    // One in-progress poll, then completion.
    gateway.push_status(job("batch_1", BatchStatus::Pending, None));
    gateway.push_status(job("batch_1", BatchStatus::Completed, Some("file_out")));
    gateway.set_file(
        "file_out",
        format!(
            "{}\n{}\n",
            output_line("t1__0", "rekeys every hire"),
            output_line("t1__1", "spreadsheet chaos"),
        ),
    );

    let orch = orchestrator(Arc::clone(&gateway), &dir);
    let mut parser = InsightParser::new(TaxonomyCatalog::seed(), "v2.0");
    let items = vec![work_item("t1", 0), work_item("t1", 1)];

    let summary = orch.run(items, &mut parser, "gpt-4o-mini", &pool).await.unwrap();

    assert_eq!(summary.chunks, 2);
    assert_eq!(summary.insights_parsed, 2);
    assert_eq!(summary.insights_inserted, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(insight_count(&pool).await, 2);

    // One file uploaded with both requests, one batch created over it.
    let uploads = gateway.uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("batch_input_part_1.jsonl".to_string(), 2)]);
    assert_eq!(
        gateway.created.lock().unwrap().clone(),
        vec!["file_batch_input_part_1.jsonl".to_string()]
    );

    // The input body also landed on disk for inspection.
    assert!(dir.path().join("batches/batch_input_part_1.jsonl").exists());

    // State records the completed run with nothing pending.
    let state = StateStore::new(dir.path().join("state.json")).load();
    assert!(!state.has_pending());
    assert_eq!(state.last_completed_batch.as_deref(), Some("batch_1"));
}

#[tokio::test]
async fn resume_polls_without_resubmitting() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let gateway = Arc::new(MockGateway::default());

    gateway.push_status(job("batch_9", BatchStatus::Completed, Some("file_out")));
    gateway.set_file("file_out", format!("{}\n", output_line("t2__0", "manual exports")));

    // Simulate a process killed mid-poll: state and chunk map on disk.
    let store = StateStore::new(dir.path().join("state.json"));
    store
        .save(&PipelineState {
            pending_batch_id: Some("batch_9".to_string()),
            part_index: Some(1),
            total_parts: Some(1),
            model: Some("gpt-4o-mini".to_string()),
            ..Default::default()
        })
        .unwrap();
    let items = vec![work_item("t2", 0)];
    store
        .save_chunk_map(&si_pipeline::models::transcript::chunk_map(&items))
        .unwrap();

    let orch = orchestrator(Arc::clone(&gateway), &dir);
    let mut parser = InsightParser::new(TaxonomyCatalog::seed(), "v2.0");

    let summary = orch
        .resume(&mut parser, "gpt-4o-mini", &pool)
        .await
        .unwrap()
        .expect("pending batch should resume");

    assert_eq!(summary.insights_inserted, 1);
    assert_eq!(insight_count(&pool).await, 1);
    assert!(gateway.uploads.lock().unwrap().is_empty());
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn resume_with_clean_state_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let orch = orchestrator(Arc::new(MockGateway::default()), &dir);
    let mut parser = InsightParser::new(TaxonomyCatalog::seed(), "v2.0");

    let resumed = orch.resume(&mut parser, "gpt-4o-mini", &pool).await.unwrap();
    assert!(resumed.is_none());
}

#[tokio::test]
async fn failed_batch_counts_errors_and_inserts_nothing() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let gateway = Arc::new(MockGateway::default());

    let mut failed = job("batch_1", BatchStatus::Failed, None);
    failed.failed = 2;
    gateway.push_status(failed);

    let orch = orchestrator(Arc::clone(&gateway), &dir);
    let mut parser = InsightParser::new(TaxonomyCatalog::seed(), "v2.0");
    let items = vec![work_item("t3", 0), work_item("t3", 1)];

    let summary = orch.run(items, &mut parser, "gpt-4o-mini", &pool).await.unwrap();
    assert!(summary.errors >= 2);
    assert_eq!(summary.insights_inserted, 0);
    assert_eq!(insight_count(&pool).await, 0);
}

#[tokio::test]
async fn failed_request_inside_completed_batch_is_isolated() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let gateway = Arc::new(MockGateway::default());

    let bad_line = serde_json::json!({
        "custom_id": "t4__1",
        "response": { "status_code": 500, "body": { "choices": [] } },
        "error": null,
    })
    .to_string();
    gateway.push_status(job("batch_1", BatchStatus::Completed, Some("file_out")));
    gateway.set_file(
        "file_out",
        format!("{}\n{}\n", output_line("t4__0", "good chunk"), bad_line),
    );

    let orch = orchestrator(Arc::clone(&gateway), &dir);
    let mut parser = InsightParser::new(TaxonomyCatalog::seed(), "v2.0");
    let items = vec![work_item("t4", 0), work_item("t4", 1)];

    let summary = orch.run(items, &mut parser, "gpt-4o-mini", &pool).await.unwrap();
    assert_eq!(summary.insights_inserted, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(insight_count(&pool).await, 1);
}

#[test]
fn workload_splits_into_bounded_input_files() {
    let dir = TempDir::new().unwrap();
    let items: Vec<ChunkWorkItem> = (0..5).map(|i| work_item("t5", i)).collect();

    let paths = write_batch_inputs(
        &dir.path().join("batches"),
        &items,
        "gpt-4o-mini",
        "system prompt",
        2,
    )
    .unwrap();

    assert_eq!(paths.len(), 3);
    let line_counts: Vec<usize> = paths
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap().lines().count())
        .collect();
    assert_eq!(line_counts, vec![2, 2, 1]);

    let first = std::fs::read_to_string(&paths[0]).unwrap();
    let line: serde_json::Value = serde_json::from_str(first.lines().next().unwrap()).unwrap();
    assert_eq!(line["custom_id"], "t5__0");
    assert_eq!(line["method"], "POST");
    assert_eq!(line["url"], "/v1/chat/completions");
    assert_eq!(line["body"]["model"], "gpt-4o-mini");
    assert_eq!(line["body"]["temperature"], 0);
}
