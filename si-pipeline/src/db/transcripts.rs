//! Transcript reads

use si_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::models::TranscriptRecord;

/// Fetch transcripts ordered by newest call first. `sample` caps the result
/// for trial runs.
pub async fn fetch_transcripts(
    pool: &SqlitePool,
    sample: Option<u32>,
) -> Result<Vec<TranscriptRecord>> {
    let base = "SELECT transcript_id, transcript_text, deal_id, deal_name, company_name,
                region, country, industry, company_size, segment, amount, deal_stage,
                deal_owner, call_date
         FROM transcripts
         ORDER BY call_date DESC, transcript_id";

    let records = match sample {
        Some(limit) => {
            sqlx::query_as::<_, TranscriptRecord>(&format!("{base} LIMIT ?"))
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, TranscriptRecord>(base)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(records)
}

/// Transcript ids that already have insights under the given prompt version.
/// Re-running with a new prompt version reprocesses everything.
pub async fn processed_transcript_ids(
    pool: &SqlitePool,
    prompt_version: &str,
) -> Result<HashSet<String>> {
    let ids: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT transcript_id FROM transcript_insights WHERE prompt_version = ?",
    )
    .bind(prompt_version)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Insert a transcript, replacing any previous text for the same id.
pub async fn upsert_transcript(pool: &SqlitePool, record: &TranscriptRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transcripts (
            transcript_id, transcript_text, deal_id, deal_name, company_name,
            region, country, industry, company_size, segment, amount,
            deal_stage, deal_owner, call_date
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (transcript_id) DO UPDATE SET
            transcript_text = excluded.transcript_text,
            deal_id = excluded.deal_id,
            deal_name = excluded.deal_name,
            company_name = excluded.company_name,
            region = excluded.region,
            country = excluded.country,
            industry = excluded.industry,
            company_size = excluded.company_size,
            segment = excluded.segment,
            amount = excluded.amount,
            deal_stage = excluded.deal_stage,
            deal_owner = excluded.deal_owner,
            call_date = excluded.call_date
        "#,
    )
    .bind(&record.transcript_id)
    .bind(&record.transcript_text)
    .bind(&record.deal_id)
    .bind(&record.deal_name)
    .bind(&record.company_name)
    .bind(&record.region)
    .bind(&record.country)
    .bind(&record.industry)
    .bind(&record.company_size)
    .bind(&record.segment)
    .bind(record.amount)
    .bind(&record.deal_stage)
    .bind(&record.deal_owner)
    .bind(&record.call_date)
    .execute(pool)
    .await?;

    Ok(())
}
