//! Ed25519 signing and verification.
//!
//! Provides signing of arbitrary byte sequences (canonical attestation
//! bytes, rotation authorizations) and verification against registered
//! public keys. Keys and signatures travel base64-encoded on the wire.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{Result, TrustError};

/// Sign a message with an Ed25519 signing key.
///
/// Returns the signature as 64 bytes.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<()> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| TrustError::SignatureInvalid)
}

/// Sign a message and return the signature as a base64-encoded string.
pub fn sign_to_base64(signing_key: &SigningKey, message: &[u8]) -> String {
    let sig = sign(signing_key, message);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, sig.to_bytes())
}

/// Verify a base64-encoded signature.
pub fn verify_from_base64(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<()> {
    let sig_bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, signature_b64)
            .map_err(|e| TrustError::InvalidKey(format!("invalid base64 signature: {e}")))?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| TrustError::InvalidKey("signature must be 64 bytes".into()))?;

    let signature = Signature::from_bytes(&sig_array);
    verify(verifying_key, message, &signature)
}

/// Decode a base64-encoded Ed25519 public key.
///
/// Agent records store their current and previous public keys in this
/// encoding; every verification path funnels through here.
pub fn decode_verifying_key(public_key_b64: &str) -> Result<VerifyingKey> {
    let key_bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, public_key_b64)
            .map_err(|e| TrustError::InvalidKey(format!("invalid base64 public key: {e}")))?;

    let key_array: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| TrustError::InvalidKey("public key must be 32 bytes".into()))?;

    VerifyingKey::from_bytes(&key_array)
        .map_err(|e| TrustError::InvalidKey(format!("invalid verifying key: {e}")))
}
