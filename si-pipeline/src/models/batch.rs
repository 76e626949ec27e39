//! Batch job observations and the persisted pipeline state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-side status of an asynchronous batch job. Everything that is not
/// one of the four terminal states is reported as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    Failed,
    Expired,
    Cancelled,
    #[serde(other)]
    Pending,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Expired => "expired",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

/// A batch job as observed from the provider. The orchestrator only reacts to
/// status transitions; it never owns the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    pub status: BatchStatus,
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub output_file_id: Option<String>,
    pub error_file_id: Option<String>,
}

/// Durable record of in-flight work, overwritten wholesale at each milestone.
/// Absent or corrupt means "nothing pending", never fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Job currently awaiting results; at most one at any time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_batch_id: Option<String>,
    /// 1-based position of the pending job when the workload was split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parts: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sibling file holding the custom_id → chunk metadata map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_map_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineState {
    pub fn has_pending(&self) -> bool {
        self.pending_batch_id.is_some()
    }

    /// Marker written after a successful run: pending fields cleared, last
    /// completed job recorded.
    pub fn completed(batch_id: &str) -> Self {
        Self {
            last_completed_batch: Some(batch_id.to_string()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// Counts reported at the end of every run. Partial success is the normal
/// case, not an exceptional one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub transcripts: usize,
    pub chunks: usize,
    pub insights_parsed: usize,
    pub insights_inserted: usize,
    pub errors: usize,
    /// Feature codes first seen during this run.
    pub new_features: Vec<String>,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.transcripts += other.transcripts;
        self.chunks += other.chunks;
        self.insights_parsed += other.insights_parsed;
        self.insights_inserted += other.insights_inserted;
        self.errors += other.errors;
        for feature in &other.new_features {
            if !self.new_features.contains(feature) {
                self.new_features.push(feature.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_statuses_collapse_to_pending() {
        for raw in ["\"validating\"", "\"in_progress\"", "\"finalizing\""] {
            let status: BatchStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, BatchStatus::Pending);
            assert!(!status.is_terminal());
        }
        for raw in ["\"completed\"", "\"failed\"", "\"expired\"", "\"cancelled\""] {
            let status: BatchStatus = serde_json::from_str(raw).unwrap();
            assert!(status.is_terminal());
            assert_ne!(status, BatchStatus::Pending);
        }
    }

    #[test]
    fn completed_marker_clears_pending() {
        let state = PipelineState {
            pending_batch_id: Some("batch_1".to_string()),
            ..Default::default()
        };
        assert!(state.has_pending());
        let done = PipelineState::completed("batch_1");
        assert!(!done.has_pending());
        assert_eq!(done.last_completed_batch.as_deref(), Some("batch_1"));
        assert!(done.completed_at.is_some());
    }
}
