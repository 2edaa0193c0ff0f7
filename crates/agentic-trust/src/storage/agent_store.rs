//! Agent record persistence.
//!
//! Each agent is stored as a single JSON file named `{agent_id}.json`
//! inside `{base_dir}/agents/`.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "agent": { ... AgentRecord ... }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentRecord};
use crate::error::{Result, TrustError};

// ── File format constants ─────────────────────────────────────────────────────

const AGENT_FILE_VERSION: u32 = 1;

const AGENTS_DIR: &str = "agents";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each agent record.
#[derive(Debug, Serialize, Deserialize)]
struct AgentFile {
    /// Format version number.
    version: u32,
    /// The stored record.
    agent: AgentRecord,
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed store for `AgentRecord`s.
///
/// Safe for single-process use; concurrent writes from multiple processes
/// are not coordinated.
pub struct AgentStore {
    base_dir: PathBuf,
}

impl AgentStore {
    /// Create a new `AgentStore` rooted at `base_dir`.
    ///
    /// Creates the `agents/` sub-directory if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(AGENTS_DIR))?;
        Ok(Self { base_dir })
    }

    /// Persist an agent record. Any existing file for the same id is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save(&self, agent: &AgentRecord) -> Result<()> {
        let file = AgentFile {
            version: AGENT_FILE_VERSION,
            agent: agent.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(self.agent_path(&agent.id), json.as_bytes())?;

        Ok(())
    }

    /// Load an agent record by id.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::UnknownAgent` if no file exists for `id`,
    /// `TrustError::InvalidFileFormat` if the file cannot be parsed, or
    /// `TrustError::Io` for other filesystem errors.
    pub fn load(&self, id: &AgentId) -> Result<AgentRecord> {
        let path = self.agent_path(id);

        if !path.exists() {
            return Err(TrustError::UnknownAgent(id.0.clone()));
        }

        let bytes = std::fs::read(&path)?;
        let file: AgentFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse agent file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.agent)
    }

    /// Return `true` if a record exists for `id`. A pure path probe.
    pub fn exists(&self, id: &AgentId) -> bool {
        self.agent_path(id).exists()
    }

    /// List the ids of all stored agents, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<AgentId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(AGENTS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(AgentId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Delete the file for an agent. Missing files are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete(&self, id: &AgentId) -> Result<()> {
        match std::fs::remove_file(self.agent_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::Io(e)),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn agent_path(&self, id: &AgentId) -> PathBuf {
        self.base_dir.join(AGENTS_DIR).join(format!("{}.json", id.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
