//! Schema bootstrap, insight upsert idempotence and taxonomy persistence.

use sqlx::SqlitePool;
use tempfile::TempDir;

use si_common::TaxonomyCatalog;
use si_pipeline::db;
use si_pipeline::models::{InsightRow, TranscriptRecord};
use si_pipeline::services::parser::NewFeature;

async fn test_pool(dir: &TempDir) -> SqlitePool {
    db::init_database(&dir.path().join("insights.db")).await.unwrap()
}

fn row(hash: &str, tid: &str, chunk: u32) -> InsightRow {
    InsightRow {
        content_hash: hash.to_string(),
        transcript_id: tid.to_string(),
        chunk_index: chunk,
        deal_id: None,
        deal_name: None,
        company_name: Some("Acme".to_string()),
        region: None,
        country: None,
        industry: None,
        company_size: None,
        segment: None,
        amount: Some(12_000.0),
        deal_stage: None,
        deal_owner: None,
        call_date: Some("2026-08-01".to_string()),
        insight_type: "pain".to_string(),
        insight_subtype: "manual_processes".to_string(),
        module: None,
        summary: "Everything is manual".to_string(),
        verbatim_quote: None,
        confidence: 0.9,
        competitor_name: None,
        competitor_relationship: None,
        feature_name: None,
        gap_description: None,
        gap_priority: None,
        faq_topic: None,
        model_used: "gpt-4o-mini".to_string(),
        prompt_version: "v2.0".to_string(),
        batch_id: None,
    }
}

fn transcript(tid: &str, text: &str, call_date: &str) -> TranscriptRecord {
    TranscriptRecord {
        transcript_id: tid.to_string(),
        transcript_text: text.to_string(),
        deal_id: None,
        deal_name: None,
        company_name: None,
        region: None,
        country: None,
        industry: None,
        company_size: None,
        segment: None,
        amount: None,
        deal_stage: None,
        deal_owner: None,
        call_date: Some(call_date.to_string()),
    }
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("insights.db");
    let pool = db::init_database(&path).await.unwrap();
    drop(pool);
    // Reopening an existing database must not fail or lose tables.
    let pool = db::init_database(&path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transcript_insights")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn upsert_skips_duplicate_content_hashes() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;

    let rows = vec![row("hash_a", "t1", 0), row("hash_b", "t1", 1)];
    let inserted = db::insights::upsert_insights(&pool, &rows).await.unwrap();
    assert_eq!(inserted, 2);

    // Re-ingesting the same rows plus one new one inserts only the new one.
    let rows = vec![row("hash_a", "t1", 0), row("hash_c", "t1", 2)];
    let inserted = db::insights::upsert_insights(&pool, &rows).await.unwrap();
    assert_eq!(inserted, 1);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transcript_insights")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn upsert_handles_more_rows_than_one_batch() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;

    let rows: Vec<InsightRow> = (0..120).map(|i| row(&format!("hash_{i}"), "t1", i)).collect();
    let inserted = db::insights::upsert_insights(&pool, &rows).await.unwrap();
    assert_eq!(inserted, 120);
}

#[tokio::test]
async fn processed_ids_are_scoped_to_prompt_version() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;

    let mut old = row("hash_old", "t1", 0);
    old.prompt_version = "v1.0".to_string();
    db::insights::upsert_insights(&pool, &[old, row("hash_new", "t2", 0)])
        .await
        .unwrap();

    let processed = db::transcripts::processed_transcript_ids(&pool, "v2.0")
        .await
        .unwrap();
    assert!(processed.contains("t2"));
    assert!(!processed.contains("t1"));
}

#[tokio::test]
async fn fetch_orders_newest_first_and_honours_sample() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;

    for (tid, date) in [("t1", "2026-01-01"), ("t2", "2026-03-01"), ("t3", "2026-02-01")] {
        db::transcripts::upsert_transcript(&pool, &transcript(tid, "Alice: hi", date))
            .await
            .unwrap();
    }

    let all = db::transcripts::fetch_transcripts(&pool, None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|t| t.transcript_id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t3", "t1"]);

    let sampled = db::transcripts::fetch_transcripts(&pool, Some(2)).await.unwrap();
    assert_eq!(sampled.len(), 2);
    assert_eq!(sampled[0].transcript_id, "t2");
}

#[tokio::test]
async fn seed_features_write_once_and_discovered_features_reload() {
    let dir = TempDir::new().unwrap();
    let pool = test_pool(&dir).await;
    let catalog = TaxonomyCatalog::seed();

    let written = db::taxonomy::seed_features(&pool, &catalog).await.unwrap();
    assert!(written > 0);
    let again = db::taxonomy::seed_features(&pool, &catalog).await.unwrap();
    assert_eq!(again, 0);

    let feature = NewFeature {
        code: "shift_bidding".to_string(),
        display_name: "Shift Bidding".to_string(),
        suggested_module: Some("time_tracking".to_string()),
    };
    db::taxonomy::register_feature(&pool, &feature).await.unwrap();
    db::taxonomy::register_feature(&pool, &feature).await.unwrap();

    let mut fresh = TaxonomyCatalog::seed();
    assert!(!fresh.is_known_feature("shift_bidding"));
    let loaded = db::taxonomy::load_discovered_features(&pool, &mut fresh)
        .await
        .unwrap();
    assert_eq!(loaded, 1);
    assert!(fresh.is_known_feature("shift_bidding"));
}
