//! Verified attestation records.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;
use crate::attestation::payload::AttestationPayload;

/// How long a verified attestation stays valid: 24 hours, measured from
/// verification time.
pub const ATTESTATION_VALIDITY_MICROS: u64 = 24 * 60 * 60 * 1_000_000;

/// Unique identifier for an attestation.
///
/// Format: `aatt_` + base58 of first 16 bytes of SHA-256 over the canonical
/// payload and its signature. Deterministic on purpose: re-ingesting the
/// same signed payload lands on the same record instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationId(pub String);

impl AttestationId {
    pub fn derive(payload: &AttestationPayload, signature_b64: &str) -> Self {
        let material = format!("attest:{}:{}", payload.canonical_json(), signature_b64);
        let hash = Sha256::digest(material.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("aatt_{encoded}"))
    }
}

impl std::fmt::Display for AttestationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the agent's keys verified the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyUsed {
    Current,
    /// The pre-rotation key, accepted only inside the grace window.
    Previous,
}

impl KeyUsed {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Current => "current",
            Self::Previous => "previous",
        }
    }
}

/// A verified attestation of one agent-to-MCP connection.
///
/// Created only by the verifier, so `signature_verified` is always true on a
/// stored record; it is kept explicit so the stored JSON is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpAttestation {
    pub id: AttestationId,
    pub agent_id: AgentId,
    pub payload: AttestationPayload,
    /// Ed25519 signature over the canonical payload, base64.
    pub signature: String,
    pub signature_verified: bool,
    /// Cleared by the expiry sweep; never set back to true.
    pub is_valid: bool,
    pub verified_at: u64,
    /// Instant at which the attestation stops being valid.
    pub expires_at: u64,
    pub invalidated_at: Option<u64>,
    pub key_used: KeyUsed,
}

impl McpAttestation {
    /// Build the record for a payload that just passed verification.
    pub fn verified(
        agent_id: AgentId,
        payload: AttestationPayload,
        signature_b64: String,
        key_used: KeyUsed,
        verified_at: u64,
    ) -> Self {
        Self {
            id: AttestationId::derive(&payload, &signature_b64),
            agent_id,
            payload,
            signature: signature_b64,
            signature_verified: true,
            is_valid: true,
            verified_at,
            expires_at: verified_at + ATTESTATION_VALIDITY_MICROS,
            invalidated_at: None,
            key_used,
        }
    }

    /// Whether the validity window has closed at `at`. An attestation with
    /// expiry `t` is valid strictly before `t`.
    pub fn is_expired(&self, at: u64) -> bool {
        at >= self.expires_at
    }

    /// Invalidate the record. Monotonic: calling this on an already-invalid
    /// record keeps the original `invalidated_at`.
    pub fn invalidate(&mut self, at: u64) {
        if self.is_valid {
            self.is_valid = false;
            self.invalidated_at = Some(at);
        }
    }
}
