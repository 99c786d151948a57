//! Persisted runtime state.
//!
//! Written when the stack reaches the ready phase so `tdv stop` and
//! `tdv status` can operate from a separate process, removed during
//! teardown. Lives at `.tdv/state.json` under the project root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeState {
    pub backend_pid: Option<u32>,
    pub frontend_pid: Option<u32>,
    /// Whether dependency services were started via the compose tool and
    /// should be torn down with it.
    pub compose_started: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl RuntimeState {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join("state.json")
    }

    /// Load the state file if one exists.
    pub fn load(state_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(state_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(state_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(state_dir), content)?;
        Ok(())
    }

    /// Remove the state file. Silent when it is already gone.
    pub fn remove(state_dir: &Path) {
        let _ = std::fs::remove_file(Self::path(state_dir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = RuntimeState {
            backend_pid: Some(4242),
            frontend_pid: Some(4243),
            compose_started: true,
            started_at: Some(Utc::now()),
        };
        state.save(dir.path()).unwrap();

        let loaded = RuntimeState::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.backend_pid, Some(4242));
        assert_eq!(loaded.frontend_pid, Some(4243));
        assert!(loaded.compose_started);
        assert!(loaded.started_at.is_some());
    }

    #[test]
    fn test_load_absent_state_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RuntimeState::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_remove_is_silent_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        RuntimeState::remove(dir.path());

        let state = RuntimeState::default();
        state.save(dir.path()).unwrap();
        RuntimeState::remove(dir.path());
        assert!(RuntimeState::load(dir.path()).unwrap().is_none());
    }
}
