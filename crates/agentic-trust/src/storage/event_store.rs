//! Verification event persistence.
//!
//! Each event is stored as a single JSON file named `{event_id}.json`
//! inside `{base_dir}/events/`.
//!
//! File format:
//! ```json
//! { "version": 1, "event": { ... VerificationEvent ... } }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrustError};
use crate::event::{EventId, VerificationEvent};

// ── File format constants ─────────────────────────────────────────────────────

const EVENT_FILE_VERSION: u32 = 1;

const EVENTS_DIR: &str = "events";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each event.
#[derive(Debug, Serialize, Deserialize)]
struct EventFile {
    /// Format version number.
    version: u32,
    /// The stored event.
    event: VerificationEvent,
}

// ── EventStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed store for `VerificationEvent`s.
pub struct EventStore {
    base_dir: PathBuf,
}

impl EventStore {
    /// Create a new `EventStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(EVENTS_DIR))?;
        Ok(Self { base_dir })
    }

    /// Persist an event. The pipeline saves the same id twice: once pending,
    /// once terminal.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save(&self, event: &VerificationEvent) -> Result<()> {
        let file = EventFile {
            version: EVENT_FILE_VERSION,
            event: event.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(self.event_path(&event.id), json.as_bytes())?;

        Ok(())
    }

    /// Load an event by id.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` if no file exists for `id`,
    /// `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for other filesystem errors.
    pub fn load(&self, id: &EventId) -> Result<VerificationEvent> {
        let path = self.event_path(id);

        if !path.exists() {
            return Err(TrustError::NotFound(format!("event not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: EventFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse event file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.event)
    }

    /// List the ids of all stored events, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<EventId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(EVENTS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(EventId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Delete an event file. Used by pipeline rollback; missing files are a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete(&self, id: &EventId) -> Result<()> {
        match std::fs::remove_file(self.event_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::Io(e)),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn event_path(&self, id: &EventId) -> PathBuf {
        self.base_dir.join(EVENTS_DIR).join(format!("{}.json", id.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
