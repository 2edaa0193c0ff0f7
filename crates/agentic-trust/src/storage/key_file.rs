//! .atk file format — encrypted agent key storage.
//!
//! An `.atk` file stores an agent's Ed25519 signing key encrypted with
//! ChaCha20-Poly1305 under a key derived from an operator passphrase via
//! Argon2id, alongside a plaintext public section for inspection without
//! decryption.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "atk-v1",
//!     "encryption": {
//!         "algorithm": "chacha20-poly1305",
//!         "kdf": "argon2id",
//!         "salt": "<base64-16-bytes>",
//!         "nonce": "<base64-12-bytes>"
//!     },
//!     "encrypted_key": "<base64-ciphertext>",
//!     "public_info": { "agent_id": ..., "public_key": ..., "created_at": ... }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::agent::AgentId;
use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::{derivation, encryption};
use crate::error::{Result, TrustError};

// ── File format constants ─────────────────────────────────────────────────────

const ATK_VERSION: u32 = 1;
const ATK_FORMAT: &str = "atk-v1";
const ATK_ALGORITHM: &str = "chacha20-poly1305";
const ATK_KDF: &str = "argon2id";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Top-level structure written to disk as an `.atk` file.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentKeyFile {
    /// Format version number.
    pub version: u32,
    /// Format identifier string.
    pub format: String,
    /// Encryption parameters needed for decryption.
    pub encryption: EncryptionMetadata,
    /// Base64-encoded ciphertext of the encrypted signing key data.
    pub encrypted_key: String,
    /// Public section (no private key material).
    pub public_info: KeyFileInfo,
}

/// Encryption metadata stored alongside the ciphertext.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Symmetric cipher used.
    pub algorithm: String,
    /// Key derivation function used.
    pub kdf: String,
    /// Base64-encoded Argon2id salt (16 bytes).
    pub salt: String,
    /// Base64-encoded ChaCha20-Poly1305 nonce (12 bytes).
    pub nonce: String,
}

/// Plaintext public section of a key file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFileInfo {
    /// Agent the key belongs to.
    pub agent_id: AgentId,
    /// Public key, base64.
    pub public_key: String,
    /// When this key was written (microseconds since Unix epoch).
    pub created_at: u64,
}

/// Private data serialized into the encrypted blob.
#[derive(Debug, Serialize, Deserialize, Zeroize)]
struct KeyPrivateData {
    /// Ed25519 signing key bytes encoded as base64.
    signing_key_b64: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Save an agent's key pair to an `.atk` file, encrypting the signing key
/// with the given passphrase.
///
/// The file is written atomically: the serialized JSON goes to a sibling
/// temporary file which is then renamed, so a concurrent reader never sees
/// a partial write.
///
/// # Errors
///
/// Returns `TrustError::DerivationFailed` if key derivation fails,
/// `TrustError::EncryptionFailed` if encryption fails, or `TrustError::Io`
/// for filesystem errors.
pub fn save_agent_key(
    keypair: &Ed25519KeyPair,
    agent_id: &AgentId,
    path: &Path,
    passphrase: &str,
) -> Result<()> {
    // 1. Collect private data.
    let mut signing_bytes = keypair.signing_key_bytes();
    let signing_key_b64 =
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signing_bytes);
    signing_bytes.zeroize();

    let private_data = KeyPrivateData { signing_key_b64 };

    // 2. Serialize private data to JSON bytes.
    let mut plaintext = serde_json::to_vec(&private_data)
        .map_err(|e| TrustError::SerializationError(e.to_string()))?;

    // 3. Derive the encryption key from the passphrase.
    //    passphrase → Argon2id(passphrase, salt) → master_key
    //    HKDF-SHA256(master_key, keyfile context) → encryption_key
    let salt = crate::crypto::random::random_salt_16();
    let mut master_key = encryption::derive_passphrase_key(passphrase.as_bytes(), &salt)?;
    let mut encryption_key = derivation::derive_key(&master_key, &derivation::keyfile_context())?;
    master_key.zeroize();

    // 4. Encrypt with ChaCha20-Poly1305; a fresh nonce is generated inside.
    let (nonce_bytes, ciphertext) = encryption::encrypt(&encryption_key, &plaintext)?;
    encryption_key.zeroize();
    plaintext.zeroize();

    // 5. Build the file structure.
    let key_file = AgentKeyFile {
        version: ATK_VERSION,
        format: ATK_FORMAT.to_string(),
        encryption: EncryptionMetadata {
            algorithm: ATK_ALGORITHM.to_string(),
            kdf: ATK_KDF.to_string(),
            salt: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, salt),
            nonce: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &nonce_bytes),
        },
        encrypted_key: base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &ciphertext,
        ),
        public_info: KeyFileInfo {
            agent_id: agent_id.clone(),
            public_key: keypair.public_key_base64(),
            created_at: crate::time::now_micros(),
        },
    };

    // 6. Write JSON to disk (atomic via temp-file-then-rename).
    let json = serde_json::to_string_pretty(&key_file)
        .map_err(|e| TrustError::SerializationError(e.to_string()))?;

    write_atomic(path, json.as_bytes())?;

    Ok(())
}

/// Load an agent key pair from an `.atk` file, decrypting with the given
/// passphrase.
///
/// # Errors
///
/// Returns `TrustError::InvalidPassphrase` if the passphrase is wrong
/// (AEAD authentication fails), `TrustError::InvalidFileFormat` for
/// malformed files, or `TrustError::Io` for filesystem errors.
pub fn load_agent_key(path: &Path, passphrase: &str) -> Result<Ed25519KeyPair> {
    // 1. Read and parse the file.
    let bytes = std::fs::read(path)?;
    let key_file: AgentKeyFile = serde_json::from_slice(&bytes)
        .map_err(|e| TrustError::InvalidFileFormat(format!("failed to parse .atk file: {e}")))?;

    // 2. Validate version and format.
    if key_file.version != ATK_VERSION || key_file.format != ATK_FORMAT {
        return Err(TrustError::InvalidFileFormat(format!(
            "unsupported .atk file version={} format={}",
            key_file.version, key_file.format,
        )));
    }

    // 3. Decode salt, nonce, and ciphertext from base64.
    let salt_bytes = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        &key_file.encryption.salt,
    )
    .map_err(|e| TrustError::InvalidFileFormat(format!("invalid salt base64: {e}")))?;

    let salt: [u8; 16] = salt_bytes
        .try_into()
        .map_err(|_| TrustError::InvalidFileFormat("salt must be 16 bytes".to_string()))?;

    let nonce_bytes = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        &key_file.encryption.nonce,
    )
    .map_err(|e| TrustError::InvalidFileFormat(format!("invalid nonce base64: {e}")))?;

    let ciphertext = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        &key_file.encrypted_key,
    )
    .map_err(|e| TrustError::InvalidFileFormat(format!("invalid ciphertext base64: {e}")))?;

    // 4. Derive the encryption key using the same KDF chain as save.
    let mut master_key = encryption::derive_passphrase_key(passphrase.as_bytes(), &salt)?;
    let mut encryption_key = derivation::derive_key(&master_key, &derivation::keyfile_context())?;
    master_key.zeroize();

    // 5. Decrypt. InvalidPassphrase is returned if AEAD authentication fails.
    let mut plaintext = encryption::decrypt(&encryption_key, &nonce_bytes, &ciphertext)?;
    encryption_key.zeroize();

    // 6. Deserialize the private data.
    let private_data: KeyPrivateData = serde_json::from_slice(&plaintext)
        .map_err(|e| TrustError::SerializationError(format!("key data: {e}")))?;
    plaintext.zeroize();

    // 7. Decode the signing key bytes from base64.
    let key_bytes_vec = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        &private_data.signing_key_b64,
    )
    .map_err(|e| TrustError::InvalidKey(format!("invalid signing key base64: {e}")))?;

    let mut key_bytes: [u8; 32] = key_bytes_vec
        .try_into()
        .map_err(|_| TrustError::InvalidKey("signing key must be 32 bytes".to_string()))?;

    // 8. Reconstruct the key pair.
    let keypair = Ed25519KeyPair::from_signing_key_bytes(&key_bytes)?;
    key_bytes.zeroize();

    Ok(keypair)
}

/// Read only the public section of an `.atk` file.
///
/// Needs no passphrase; useful for identifying whose key a file holds
/// without decrypting it.
///
/// # Errors
///
/// Returns `TrustError::InvalidFileFormat` for malformed files or
/// `TrustError::Io` for filesystem errors.
pub fn read_public_info(path: &Path) -> Result<KeyFileInfo> {
    let bytes = std::fs::read(path)?;
    let key_file: AgentKeyFile = serde_json::from_slice(&bytes)
        .map_err(|e| TrustError::InvalidFileFormat(format!("failed to parse .atk file: {e}")))?;
    Ok(key_file.public_info)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist. A crash during the
/// write cannot leave a partially-written file visible to readers.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("atk.tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
