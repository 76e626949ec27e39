//! Content hashing for insight deduplication
//!
//! The hash is the natural key the persistence sink upserts on: reprocessing
//! the same chunk after a retry or crash converges to the same row.

use sha2::{Digest, Sha256};

/// SHA-256 over the insight's defining fields, hex-encoded.
///
/// Reproducible from exactly these five inputs; any content change that
/// matters for dedup changes the hash.
pub fn content_hash(
    transcript_id: &str,
    chunk_index: u32,
    insight_type: &str,
    insight_subtype: &str,
    summary: &str,
) -> String {
    let mut hasher = Sha256::new();
    let raw = format!(
        "{}|{}|{}|{}|{}",
        transcript_id, chunk_index, insight_type, insight_subtype, summary
    );
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = content_hash("t-1", 0, "pain", "manual_processes", "Payroll is run by hand");
        let b = content_hash("t-1", 0, "pain", "manual_processes", "Payroll is run by hand");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_changes_with_each_field() {
        let base = content_hash("t-1", 0, "pain", "manual_processes", "summary");
        assert_ne!(base, content_hash("t-2", 0, "pain", "manual_processes", "summary"));
        assert_ne!(base, content_hash("t-1", 1, "pain", "manual_processes", "summary"));
        assert_ne!(base, content_hash("t-1", 0, "faq", "manual_processes", "summary"));
        assert_ne!(base, content_hash("t-1", 0, "pain", "low_adoption", "summary"));
        assert_ne!(base, content_hash("t-1", 0, "pain", "manual_processes", "other"));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // The separator keeps adjacent fields from colliding.
        let a = content_hash("t", 1, "pain", "x", "y");
        let b = content_hash("t", 1, "pain", "x|y", "");
        assert_ne!(a, b);
    }
}
