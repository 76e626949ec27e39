//! Data models for the extraction pipeline

pub mod batch;
pub mod insight;
pub mod transcript;

pub use batch::{BatchJob, BatchStatus, PipelineState, RunSummary};
pub use insight::{GapPriority, InsightRow, InsightType, InsightsResponse, RawInsight};
pub use transcript::{Chunk, ChunkMapEntry, ChunkWorkItem, CrmContext, TranscriptRecord};
