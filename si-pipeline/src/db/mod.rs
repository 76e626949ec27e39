//! Database initialization and access
//!
//! SQLite via sqlx. The schema is created on first open and every statement
//! is idempotent, so a fresh data directory bootstraps itself.

pub mod insights;
pub mod taxonomy;
pub mod transcripts;

use si_common::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the insights database and ensure the schema.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    // WAL keeps readers unblocked while the ingest side writes.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_transcripts_table(&pool).await?;
    create_insights_table(&pool).await?;
    create_taxonomy_features_table(&pool).await?;

    Ok(pool)
}

async fn create_transcripts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcripts (
            transcript_id TEXT PRIMARY KEY,
            transcript_text TEXT NOT NULL,
            deal_id TEXT,
            deal_name TEXT,
            company_name TEXT,
            region TEXT,
            country TEXT,
            industry TEXT,
            company_size TEXT,
            segment TEXT,
            amount REAL,
            deal_stage TEXT,
            deal_owner TEXT,
            call_date TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_insights_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcript_insights (
            content_hash TEXT PRIMARY KEY,
            transcript_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            deal_id TEXT,
            deal_name TEXT,
            company_name TEXT,
            region TEXT,
            country TEXT,
            industry TEXT,
            company_size TEXT,
            segment TEXT,
            amount REAL,
            deal_stage TEXT,
            deal_owner TEXT,
            call_date TEXT,
            insight_type TEXT NOT NULL,
            insight_subtype TEXT NOT NULL,
            module TEXT,
            summary TEXT NOT NULL,
            verbatim_quote TEXT,
            confidence REAL NOT NULL,
            competitor_name TEXT,
            competitor_relationship TEXT,
            feature_name TEXT,
            gap_description TEXT,
            gap_priority TEXT,
            faq_topic TEXT,
            model_used TEXT NOT NULL,
            prompt_version TEXT NOT NULL,
            batch_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_insights_transcript
         ON transcript_insights (transcript_id, prompt_version)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_insights_type
         ON transcript_insights (insight_type, insight_subtype)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_taxonomy_features_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS taxonomy_features (
            code TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            suggested_module TEXT,
            is_seed INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
