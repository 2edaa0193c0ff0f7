//! Alert persistence.
//!
//! Each alert is stored as a single JSON file named `{alert_id}.json`
//! inside `{base_dir}/alerts/`.
//!
//! File format:
//! ```json
//! { "version": 1, "alert": { ... Alert ... } }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::alert::{Alert, AlertId};
use crate::error::{Result, TrustError};

// ── File format constants ─────────────────────────────────────────────────────

const ALERT_FILE_VERSION: u32 = 1;

const ALERTS_DIR: &str = "alerts";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for each alert.
#[derive(Debug, Serialize, Deserialize)]
struct AlertFile {
    /// Format version number.
    version: u32,
    /// The stored alert.
    alert: Alert,
}

// ── AlertStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed store for `Alert`s.
pub struct AlertStore {
    base_dir: PathBuf,
}

impl AlertStore {
    /// Create a new `AlertStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(ALERTS_DIR))?;
        Ok(Self { base_dir })
    }

    /// Persist an alert.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save(&self, alert: &Alert) -> Result<()> {
        let file = AlertFile {
            version: ALERT_FILE_VERSION,
            alert: alert.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(self.alert_path(&alert.id), json.as_bytes())?;

        Ok(())
    }

    /// Load an alert by id.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` if no file exists for `id`,
    /// `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for other filesystem errors.
    pub fn load(&self, id: &AlertId) -> Result<Alert> {
        let path = self.alert_path(id);

        if !path.exists() {
            return Err(TrustError::NotFound(format!("alert not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: AlertFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse alert file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.alert)
    }

    /// List the ids of all stored alerts, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<AlertId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(ALERTS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(AlertId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Delete an alert file. Used by pipeline rollback; missing files are a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete(&self, id: &AlertId) -> Result<()> {
        match std::fs::remove_file(self.alert_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::Io(e)),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn alert_path(&self, id: &AlertId) -> PathBuf {
        self.base_dir.join(ALERTS_DIR).join(format!("{}.json", id.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
