//! Key derivation using HKDF-SHA256.
//!
//! Derives scoped keys from a master key using context strings, so the
//! same passphrase-derived master key can serve distinct purposes
//! (key-file encryption today) without reuse across domains.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{Result, TrustError};

/// Derive a 32-byte key from a master key and context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the master key as IKM and
/// the context as info.
pub fn derive_key(master_key: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, master_key);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| TrustError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}

/// Build the derivation context for `.atk` key-file encryption.
pub fn keyfile_context() -> String {
    "agentic-trust/keyfile".to_string()
}
