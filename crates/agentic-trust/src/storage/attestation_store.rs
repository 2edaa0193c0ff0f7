//! Attestation and connection persistence.
//!
//! Attestations and the connection records they feed live in sibling
//! directories under one store, since every ingested attestation touches
//! both:
//!
//! ```text
//! {base_dir}/
//! ├── attestations/
//! │   └── {attestation_id}.json
//! └── connections/
//!     └── {connection_id}.json
//! ```
//!
//! File formats:
//! ```json
//! { "version": 1, "attestation": { ... McpAttestation ... } }
//! { "version": 1, "connection": { ... AgentMcpConnection ... } }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::attestation::connection::{AgentMcpConnection, ConnectionId};
use crate::attestation::record::{AttestationId, McpAttestation};
use crate::error::{Result, TrustError};

// ── File format constants ─────────────────────────────────────────────────────

const ATTESTATION_FILE_VERSION: u32 = 1;

const ATTESTATIONS_DIR: &str = "attestations";
const CONNECTIONS_DIR: &str = "connections";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Wrapper written to disk for each attestation.
#[derive(Debug, Serialize, Deserialize)]
struct AttestationFile {
    /// Format version number.
    version: u32,
    /// The stored attestation.
    attestation: McpAttestation,
}

/// Wrapper written to disk for each connection.
#[derive(Debug, Serialize, Deserialize)]
struct ConnectionFile {
    /// Format version number.
    version: u32,
    /// The stored connection.
    connection: AgentMcpConnection,
}

// ── AttestationStore ──────────────────────────────────────────────────────────

/// Filesystem-backed store for attestations and their connections.
pub struct AttestationStore {
    base_dir: PathBuf,
}

impl AttestationStore {
    /// Create a new `AttestationStore` rooted at `base_dir`.
    ///
    /// Creates both sub-directories if they do not already exist.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if a directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(ATTESTATIONS_DIR))?;
        std::fs::create_dir_all(base_dir.join(CONNECTIONS_DIR))?;
        Ok(Self { base_dir })
    }

    // ── Attestation persistence ───────────────────────────────────────────────

    /// Persist an attestation. Re-saving the same id overwrites.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save_attestation(&self, attestation: &McpAttestation) -> Result<()> {
        let file = AttestationFile {
            version: ATTESTATION_FILE_VERSION,
            attestation: attestation.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(self.attestation_path(&attestation.id), json.as_bytes())?;

        Ok(())
    }

    /// Load an attestation by id.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` if no file exists for `id`,
    /// `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for other filesystem errors.
    pub fn load_attestation(&self, id: &AttestationId) -> Result<McpAttestation> {
        let path = self.attestation_path(id);

        if !path.exists() {
            return Err(TrustError::NotFound(format!("attestation not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: AttestationFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse attestation file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.attestation)
    }

    /// List the ids of all stored attestations, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list_attestations(&self) -> Result<Vec<AttestationId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(ATTESTATIONS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(AttestationId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Delete an attestation file. Missing files are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete_attestation(&self, id: &AttestationId) -> Result<()> {
        match std::fs::remove_file(self.attestation_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::Io(e)),
        }
    }

    // ── Connection persistence ────────────────────────────────────────────────

    /// Persist a connection. The deterministic connection id makes this an
    /// upsert for its (agent, url) pair.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save_connection(&self, connection: &AgentMcpConnection) -> Result<()> {
        let file = ConnectionFile {
            version: ATTESTATION_FILE_VERSION,
            connection: connection.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;

        std::fs::write(self.connection_path(&connection.id), json.as_bytes())?;

        Ok(())
    }

    /// Load a connection by id, or `None` if the pair has never been seen.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for filesystem errors.
    pub fn load_connection(&self, id: &ConnectionId) -> Result<Option<AgentMcpConnection>> {
        let path = self.connection_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&path)?;
        let file: ConnectionFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse connection file {}: {e}",
                path.display()
            ))
        })?;

        Ok(Some(file.connection))
    }

    /// List the ids of all stored connections, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list_connections(&self) -> Result<Vec<ConnectionId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(CONNECTIONS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(ConnectionId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn attestation_path(&self, id: &AttestationId) -> PathBuf {
        self.base_dir
            .join(ATTESTATIONS_DIR)
            .join(format!("{}.json", id.0))
    }

    fn connection_path(&self, id: &ConnectionId) -> PathBuf {
        self.base_dir
            .join(CONNECTIONS_DIR)
            .join(format!("{}.json", id.0))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
