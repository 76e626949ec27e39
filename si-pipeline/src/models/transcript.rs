//! Transcripts, chunks and the work items sent to the inference service

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// Flat CRM context attached to a call transcript. All fields are optional;
/// whatever the connector matched is carried through onto every insight row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmContext {
    pub deal_id: Option<String>,
    pub deal_name: Option<String>,
    pub company_name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub segment: Option<String>,
    pub amount: Option<f64>,
    pub deal_stage: Option<String>,
    pub deal_owner: Option<String>,
    pub call_date: Option<String>,
}

/// A raw call transcript as fetched from the transcripts table.
/// Immutable once fetched; the pipeline only reads it.
#[derive(Debug, Clone, FromRow)]
pub struct TranscriptRecord {
    pub transcript_id: String,
    pub transcript_text: String,
    pub deal_id: Option<String>,
    pub deal_name: Option<String>,
    pub company_name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub segment: Option<String>,
    pub amount: Option<f64>,
    pub deal_stage: Option<String>,
    pub deal_owner: Option<String>,
    pub call_date: Option<String>,
}

impl TranscriptRecord {
    pub fn crm_context(&self) -> CrmContext {
        CrmContext {
            deal_id: self.deal_id.clone(),
            deal_name: self.deal_name.clone(),
            company_name: self.company_name.clone(),
            region: self.region.clone(),
            country: self.country.clone(),
            industry: self.industry.clone(),
            company_size: self.company_size.clone(),
            segment: self.segment.clone(),
            amount: self.amount,
            deal_stage: self.deal_stage.clone(),
            deal_owner: self.deal_owner.clone(),
            call_date: self.call_date.clone(),
        }
    }
}

/// One bounded-size slice of a transcript.
///
/// `chunk_index` is zero-based and gap-free per transcript; concatenating
/// chunk texts in index order reconstructs the transcript modulo boundary
/// whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub transcript_id: String,
    pub chunk_index: u32,
    pub text: String,
    pub token_count: usize,
}

/// A chunk plus everything needed to build and correlate its request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkWorkItem {
    /// `{transcript_id}__{chunk_index}`, the correlation key across the
    /// whole pipeline, including asynchronous batch results.
    pub custom_id: String,
    pub chunk: Chunk,
    pub metadata: CrmContext,
}

impl ChunkWorkItem {
    pub fn new(chunk: Chunk, metadata: CrmContext) -> Self {
        let custom_id = format!("{}__{}", chunk.transcript_id, chunk.chunk_index);
        Self { custom_id, chunk, metadata }
    }
}

/// Persisted entry of the custom_id → chunk metadata map, written alongside
/// the pipeline state so batch results can be reassembled after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMapEntry {
    pub transcript_id: String,
    pub chunk_index: u32,
    pub metadata: CrmContext,
}

/// Build the persisted chunk map for a set of work items.
pub fn chunk_map(items: &[ChunkWorkItem]) -> HashMap<String, ChunkMapEntry> {
    items
        .iter()
        .map(|item| {
            (
                item.custom_id.clone(),
                ChunkMapEntry {
                    transcript_id: item.chunk.transcript_id.clone(),
                    chunk_index: item.chunk.chunk_index,
                    metadata: item.metadata.clone(),
                },
            )
        })
        .collect()
}
