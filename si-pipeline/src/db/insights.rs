//! Insight persistence
//!
//! Inserts are idempotent on `content_hash`: re-ingesting the same batch
//! output, or re-running a transcript whose text has not changed, inserts
//! nothing new. Rows go in batches of 50; a failed batch falls back to
//! row-at-a-time so one bad row cannot sink its 49 neighbours.

use si_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::InsightRow;

const UPSERT_BATCH_SIZE: usize = 50;

/// Insert rows, skipping any whose content hash already exists. Returns the
/// number actually inserted.
pub async fn upsert_insights(pool: &SqlitePool, rows: &[InsightRow]) -> Result<u64> {
    let mut inserted = 0u64;
    for batch in rows.chunks(UPSERT_BATCH_SIZE) {
        match insert_batch(pool, batch).await {
            Ok(count) => inserted += count,
            Err(err) => {
                tracing::warn!(
                    batch_len = batch.len(),
                    error = %err,
                    "Batch insert failed, retrying row by row"
                );
                for row in batch {
                    match insert_batch(pool, std::slice::from_ref(row)).await {
                        Ok(count) => inserted += count,
                        Err(err) => {
                            tracing::error!(
                                content_hash = %row.content_hash,
                                error = %err,
                                "Skipping uninsertable insight row"
                            );
                        }
                    }
                }
            }
        }
    }
    Ok(inserted)
}

async fn insert_batch(pool: &SqlitePool, rows: &[InsightRow]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO transcript_insights (
            content_hash, transcript_id, chunk_index,
            deal_id, deal_name, company_name, region, country, industry,
            company_size, segment, amount, deal_stage, deal_owner, call_date,
            insight_type, insight_subtype, module, summary, verbatim_quote,
            confidence, competitor_name, competitor_relationship, feature_name,
            gap_description, gap_priority, faq_topic,
            model_used, prompt_version, batch_id
        ) ",
    );

    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.content_hash)
            .push_bind(&row.transcript_id)
            .push_bind(row.chunk_index)
            .push_bind(&row.deal_id)
            .push_bind(&row.deal_name)
            .push_bind(&row.company_name)
            .push_bind(&row.region)
            .push_bind(&row.country)
            .push_bind(&row.industry)
            .push_bind(&row.company_size)
            .push_bind(&row.segment)
            .push_bind(row.amount)
            .push_bind(&row.deal_stage)
            .push_bind(&row.deal_owner)
            .push_bind(&row.call_date)
            .push_bind(&row.insight_type)
            .push_bind(&row.insight_subtype)
            .push_bind(&row.module)
            .push_bind(&row.summary)
            .push_bind(&row.verbatim_quote)
            .push_bind(row.confidence)
            .push_bind(&row.competitor_name)
            .push_bind(&row.competitor_relationship)
            .push_bind(&row.feature_name)
            .push_bind(&row.gap_description)
            .push_bind(&row.gap_priority)
            .push_bind(&row.faq_topic)
            .push_bind(&row.model_used)
            .push_bind(&row.prompt_version)
            .push_bind(&row.batch_id);
    });
    builder.push(" ON CONFLICT (content_hash) DO NOTHING");

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Count of stored insights per type, for the status report.
pub async fn insight_counts(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT insight_type, COUNT(*) FROM transcript_insights
         GROUP BY insight_type ORDER BY insight_type",
    )
    .fetch_all(pool)
    .await?;
    Ok(counts)
}
