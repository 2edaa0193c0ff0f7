//! Rotating credential records.
//!
//! The credential *value* (the opaque token handed to the caller) is never
//! stored; records carry only its SHA-256 hash. Presenting a token means
//! hashing it and looking the hash up, so a store compromise leaks no usable
//! credentials.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;

/// How long a refresh credential stays valid: 90 days from issuance.
pub const REFRESH_CREDENTIAL_VALIDITY_MICROS: u64 = 90 * 24 * 60 * 60 * 1_000_000;

/// Advertised lifetime of an access credential, in seconds.
pub const ACCESS_CREDENTIAL_VALIDITY_SECS: u64 = 86_400;

/// Token-type label in refresh responses.
pub const TOKEN_TYPE: &str = "Bearer";

/// Unique identifier for a credential.
///
/// Format: `acrd_` + base58 of first 16 bytes of SHA-256 over the token
/// hash. One token value maps to exactly one credential record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn derive(token_hash: &str) -> Self {
        let material = format!("credential:{token_hash}");
        let hash = Sha256::digest(material.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("acrd_{encoded}"))
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash a credential token for storage and lookup. Hex-encoded SHA-256.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Why a credential was revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationReason {
    Compromised,
    PolicyViolation,
    ManualRevocation,
    /// Revoked because an ancestor in its lineage was revoked with cascade.
    Cascade,
}

impl RevocationReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Compromised => "compromised",
            Self::PolicyViolation => "policy_violation",
            Self::ManualRevocation => "manual_revocation",
            Self::Cascade => "cascade",
        }
    }
}

/// One credential in a rotation lineage.
///
/// Roots have no parent; every refresh mints a child whose `parent_id`
/// points at the presented credential. Rotation never revokes the parent —
/// it stays valid until its own expiry or an explicit revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub agent_id: AgentId,
    /// Caller-declared device or session identity the credential is bound to.
    pub device_identity: String,
    /// Hex SHA-256 of the token value.
    pub token_hash: String,
    pub parent_id: Option<CredentialId>,
    /// 0 for a root; parent's count + 1 for each refresh.
    pub rotation_count: u32,
    pub issued_at: u64,
    pub expires_at: u64,
    pub last_used_at: Option<u64>,
    pub use_count: u64,
    pub revoked: bool,
    pub revoked_at: Option<u64>,
    pub revocation_reason: Option<RevocationReason>,
}

impl Credential {
    /// Create a root credential for a new device/session.
    pub fn root(
        agent_id: AgentId,
        device_identity: impl Into<String>,
        token_hash: String,
        at: u64,
    ) -> Self {
        Self {
            id: CredentialId::derive(&token_hash),
            agent_id,
            device_identity: device_identity.into(),
            token_hash,
            parent_id: None,
            rotation_count: 0,
            issued_at: at,
            expires_at: at + REFRESH_CREDENTIAL_VALIDITY_MICROS,
            last_used_at: None,
            use_count: 0,
            revoked: false,
            revoked_at: None,
            revocation_reason: None,
        }
    }

    /// Create the child minted by refreshing `parent`.
    ///
    /// Inherits the agent and device identity; the rotation count continues
    /// the lineage.
    pub fn child_of(parent: &Credential, token_hash: String, at: u64) -> Self {
        Self {
            id: CredentialId::derive(&token_hash),
            agent_id: parent.agent_id.clone(),
            device_identity: parent.device_identity.clone(),
            token_hash,
            parent_id: Some(parent.id.clone()),
            rotation_count: parent.rotation_count + 1,
            issued_at: at,
            expires_at: at + REFRESH_CREDENTIAL_VALIDITY_MICROS,
            last_used_at: None,
            use_count: 0,
            revoked: false,
            revoked_at: None,
            revocation_reason: None,
        }
    }

    /// Whether the natural validity window has closed at `at`.
    pub fn is_expired(&self, at: u64) -> bool {
        at >= self.expires_at
    }

    /// Record one presentation of this credential.
    pub fn record_use(&mut self, at: u64) {
        self.use_count += 1;
        self.last_used_at = Some(match self.last_used_at {
            Some(prev) => prev.max(at),
            None => at,
        });
    }

    /// Revoke the credential. Monotonic: a second revocation keeps the
    /// original instant and reason.
    pub fn revoke(&mut self, reason: RevocationReason, at: u64) {
        if !self.revoked {
            self.revoked = true;
            self.revoked_at = Some(at);
            self.revocation_reason = Some(reason);
        }
    }
}
