//! Trust score history persistence.
//!
//! The history is the audit trail behind every cached trust score. It is
//! append-only: one JSON file per entry, grouped per agent so concurrent
//! recalculations for different agents never touch the same directory and
//! concurrent recalculations for the same agent write distinct files:
//!
//! ```text
//! {base_dir}/history/
//! └── {agent_id}/
//!     └── {entry_id}.json
//! ```
//!
//! File format:
//! ```json
//! { "version": 1, "entry": { ... TrustScoreHistoryEntry ... } }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::{Result, TrustError};
use crate::score::TrustScoreHistoryEntry;

// ── File format constants ─────────────────────────────────────────────────────

const HISTORY_FILE_VERSION: u32 = 1;

const HISTORY_DIR: &str = "history";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each history entry.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryEntryFile {
    /// Format version number.
    version: u32,
    /// The stored entry.
    entry: TrustScoreHistoryEntry,
}

// ── HistoryStore ──────────────────────────────────────────────────────────────

/// Filesystem-backed, append-only store for score history entries.
pub struct HistoryStore {
    base_dir: PathBuf,
}

impl HistoryStore {
    /// Create a new `HistoryStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(HISTORY_DIR))?;
        Ok(Self { base_dir })
    }

    /// Append one entry to an agent's history.
    ///
    /// Entry ids are unique per entry, so two concurrent recalculations both
    /// land; nothing is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn append(&self, entry: &TrustScoreHistoryEntry) -> Result<()> {
        let agent_dir = self.agent_dir(&entry.agent_id);
        std::fs::create_dir_all(&agent_dir)?;

        let file = HistoryEntryFile {
            version: HISTORY_FILE_VERSION,
            entry: entry.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(agent_dir.join(format!("{}.json", entry.id)), json.as_bytes())?;

        Ok(())
    }

    /// Load an agent's full history, oldest first.
    ///
    /// An agent with no history yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for filesystem errors.
    pub fn list_for_agent(&self, agent_id: &AgentId) -> Result<Vec<TrustScoreHistoryEntry>> {
        let agent_dir = self.agent_dir(agent_id);
        if !agent_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&agent_dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = std::fs::read(&path)?;
            let file: HistoryEntryFile = serde_json::from_slice(&bytes).map_err(|e| {
                TrustError::InvalidFileFormat(format!(
                    "failed to parse history file {}: {e}",
                    path.display()
                ))
            })?;
            entries.push(file.entry);
        }

        entries.sort_by_key(|e| e.recorded_at);
        Ok(entries)
    }

    /// Number of history entries for an agent.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn count_for_agent(&self, agent_id: &AgentId) -> Result<u64> {
        let agent_dir = self.agent_dir(agent_id);
        if !agent_dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        for dir_entry in std::fs::read_dir(&agent_dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// The instant of the newest entry, if any.
    ///
    /// # Errors
    ///
    /// Same as [`HistoryStore::list_for_agent`].
    pub fn newest_for_agent(&self, agent_id: &AgentId) -> Result<Option<u64>> {
        Ok(self
            .list_for_agent(agent_id)?
            .last()
            .map(|entry| entry.recorded_at))
    }

    /// Delete one entry. Exists only for pipeline rollback; nothing else
    /// removes history.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete(&self, agent_id: &AgentId, entry_id: &str) -> Result<()> {
        let path = self.agent_dir(agent_id).join(format!("{entry_id}.json"));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::Io(e)),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn agent_dir(&self, agent_id: &AgentId) -> PathBuf {
        self.base_dir.join(HISTORY_DIR).join(&agent_id.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
