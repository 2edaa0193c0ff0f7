//! Credential persistence with hash-keyed lookup.
//!
//! Presenting a credential means hashing its token and resolving that hash
//! to a record. To keep that a constant number of file reads, the store
//! maintains a pointer file per token hash next to the records:
//!
//! ```text
//! {base_dir}/credentials/
//! ├── records/
//! │   └── {credential_id}.json
//! └── hashes/
//!     └── {token_hash_hex}.json      (hash → credential id pointer)
//! ```
//!
//! File formats:
//! ```json
//! { "version": 1, "credential": { ... Credential ... } }
//! { "version": 1, "credential_id": "acrd_..." }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, CredentialId};
use crate::error::{Result, TrustError};

// ── File format constants ─────────────────────────────────────────────────────

const CREDENTIAL_FILE_VERSION: u32 = 1;

const CREDENTIALS_DIR: &str = "credentials";
const RECORDS_DIR: &str = "records";
const HASHES_DIR: &str = "hashes";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Wrapper written to disk for each credential.
#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    /// Format version number.
    version: u32,
    /// The stored credential.
    credential: Credential,
}

/// Pointer from a token hash to its credential id.
#[derive(Debug, Serialize, Deserialize)]
struct HashPointerFile {
    /// Format version number.
    version: u32,
    /// Id of the credential whose token hashes to this file's name.
    credential_id: CredentialId,
}

// ── CredentialStore ───────────────────────────────────────────────────────────

/// Filesystem-backed store for `Credential`s, addressable by id or by
/// token hash.
pub struct CredentialStore {
    base_dir: PathBuf,
}

impl CredentialStore {
    /// Create a new `CredentialStore` rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if a directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(CREDENTIALS_DIR).join(RECORDS_DIR))?;
        std::fs::create_dir_all(base_dir.join(CREDENTIALS_DIR).join(HASHES_DIR))?;
        Ok(Self { base_dir })
    }

    /// Persist a credential and its hash pointer.
    ///
    /// The pointer is written after the record, so a reader following the
    /// pointer always finds the record.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::SerializationError` if serialization fails, or
    /// `TrustError::Io` for filesystem errors.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let file = CredentialFile {
            version: CREDENTIAL_FILE_VERSION,
            credential: credential.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;
        std::fs::write(self.record_path(&credential.id), json.as_bytes())?;

        let pointer = HashPointerFile {
            version: CREDENTIAL_FILE_VERSION,
            credential_id: credential.id.clone(),
        };
        let pointer_json = serde_json::to_string_pretty(&pointer)
            .map_err(|e| TrustError::SerializationError(e.to_string()))?;
        std::fs::write(
            self.hash_path(&credential.token_hash),
            pointer_json.as_bytes(),
        )?;

        Ok(())
    }

    /// Load a credential by id.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` if no record exists for `id`,
    /// `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for other filesystem errors.
    pub fn load(&self, id: &CredentialId) -> Result<Credential> {
        let path = self.record_path(id);

        if !path.exists() {
            return Err(TrustError::NotFound(format!("credential not found: {id}")));
        }

        let bytes = std::fs::read(&path)?;
        let file: CredentialFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse credential file {}: {e}",
                path.display()
            ))
        })?;

        Ok(file.credential)
    }

    /// Resolve a token hash to its credential, or `None` for an unknown
    /// hash. Two file reads: the pointer, then the record.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::InvalidFileFormat` for malformed files, or
    /// `TrustError::Io` for filesystem errors.
    pub fn find_by_hash(&self, token_hash: &str) -> Result<Option<Credential>> {
        let path = self.hash_path(token_hash);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&path)?;
        let pointer: HashPointerFile = serde_json::from_slice(&bytes).map_err(|e| {
            TrustError::InvalidFileFormat(format!(
                "failed to parse credential pointer {}: {e}",
                path.display()
            ))
        })?;

        self.load(&pointer.credential_id).map(Some)
    }

    /// List the ids of all stored credentials, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<CredentialId>> {
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(self.base_dir.join(CREDENTIALS_DIR).join(RECORDS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                ids.push(CredentialId(stem.to_string()));
            }
        }

        Ok(ids)
    }

    /// Load the direct children of a credential. A full scan; lineages are
    /// short (one refresh per rotation), so this stays cheap.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialStore::load`] for each record.
    pub fn children_of(&self, parent: &CredentialId) -> Result<Vec<Credential>> {
        let mut children = Vec::new();
        for id in self.list()? {
            let credential = self.load(&id)?;
            if credential.parent_id.as_ref() == Some(parent) {
                children.push(credential);
            }
        }
        Ok(children)
    }

    /// Delete a credential record and its hash pointer. Used for refresh
    /// rollback; missing files are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` for filesystem errors other than "not found".
    pub fn delete(&self, credential: &Credential) -> Result<()> {
        for path in [
            self.record_path(&credential.id),
            self.hash_path(&credential.token_hash),
        ] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TrustError::Io(e)),
            }
        }
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn record_path(&self, id: &CredentialId) -> PathBuf {
        self.base_dir
            .join(CREDENTIALS_DIR)
            .join(RECORDS_DIR)
            .join(format!("{}.json", id.0))
    }

    fn hash_path(&self, token_hash: &str) -> PathBuf {
        self.base_dir
            .join(CREDENTIALS_DIR)
            .join(HASHES_DIR)
            .join(format!("{token_hash}.json"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
