//! Crash-safe run state persisted as JSON on disk
//!
//! The state file is what makes a batch run resumable: once a batch is
//! submitted the id lands here before polling begins, so a killed process
//! can re-enter polling without resubmitting. Writes go through a temp file
//! and an atomic rename so readers never see a half-written file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use si_common::Result;

use crate::models::{ChunkMapEntry, PipelineState};

pub struct StateStore {
    state_path: PathBuf,
}

impl StateStore {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.state_path
    }

    fn chunk_map_path(&self) -> PathBuf {
        self.state_path.with_extension("chunks.json")
    }

    /// Load the persisted state. Missing or corrupt files yield the default
    /// (no pending batch) with a warning rather than an error, so a damaged
    /// state file can never wedge the pipeline.
    pub fn load(&self) -> PipelineState {
        match std::fs::read_to_string(&self.state_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(
                        path = %self.state_path.display(),
                        error = %err,
                        "State file is corrupt, starting fresh"
                    );
                    PipelineState::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PipelineState::default(),
            Err(err) => {
                tracing::warn!(
                    path = %self.state_path.display(),
                    error = %err,
                    "State file unreadable, starting fresh"
                );
                PipelineState::default()
            }
        }
    }

    pub fn save(&self, state: &PipelineState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| si_common::Error::Internal(format!("state serialization: {e}")))?;
        write_atomic(&self.state_path, json.as_bytes())
    }

    /// Persist the custom_id -> chunk mapping alongside the state file. The
    /// ingest side needs it to correlate batch output lines back to chunks.
    pub fn save_chunk_map(&self, map: &HashMap<String, ChunkMapEntry>) -> Result<()> {
        let json = serde_json::to_string(map)
            .map_err(|e| si_common::Error::Internal(format!("chunk map serialization: {e}")))?;
        write_atomic(&self.chunk_map_path(), json.as_bytes())
    }

    pub fn load_chunk_map(&self) -> Result<HashMap<String, ChunkMapEntry>> {
        let path = self.chunk_map_path();
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            si_common::Error::NotFound(format!("chunk map {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| si_common::Error::Internal(format!("chunk map parse: {e}")))
    }

    /// Remove the state and chunk map files after a run fully completes.
    pub fn clear(&self) -> Result<()> {
        for path in [self.state_path.clone(), self.chunk_map_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> StateStore {
        StateStore::new(dir.path().join("state.json"))
    }

    #[test]
    fn missing_state_loads_default() {
        let dir = TempDir::new().unwrap();
        let state = store(&dir).load();
        assert!(!state.has_pending());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let state = PipelineState {
            pending_batch_id: Some("batch_123".to_string()),
            part_index: Some(1),
            total_parts: Some(3),
            ..Default::default()
        };
        s.save(&state).unwrap();

        let loaded = s.load();
        assert!(loaded.has_pending());
        assert_eq!(loaded.pending_batch_id.as_deref(), Some("batch_123"));
    }

    #[test]
    fn direct_run_marker_roundtrips_without_pending_work() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.save(&PipelineState::completed("direct_api")).unwrap();

        let loaded = s.load();
        assert!(!loaded.has_pending());
        assert_eq!(loaded.last_completed_batch.as_deref(), Some("direct_api"));
        assert!(loaded.completed_at.is_some());
    }

    #[test]
    fn corrupt_state_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        std::fs::write(s.path(), b"{{{garbage").unwrap();
        let state = s.load();
        assert!(!state.has_pending());
    }

    #[test]
    fn chunk_map_roundtrips_and_clear_removes_both() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.save(&PipelineState::default()).unwrap();

        let mut map = HashMap::new();
        map.insert(
            "t1__0".to_string(),
            ChunkMapEntry {
                transcript_id: "t1".to_string(),
                chunk_index: 0,
                metadata: Default::default(),
            },
        );
        s.save_chunk_map(&map).unwrap();

        let loaded = s.load_chunk_map().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["t1__0"].transcript_id, "t1");

        s.clear().unwrap();
        assert!(!s.path().exists());
        assert!(s.load_chunk_map().is_err());
    }
}
