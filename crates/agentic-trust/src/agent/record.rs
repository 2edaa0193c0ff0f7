//! The agent record and its key-rotation state machine.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::signing;
use crate::drift::DeclaredEnvelope;
use crate::error::{Result, TrustError};
use crate::score::TrustScore;

/// Unique identifier for an agent.
///
/// Format: `aagt_` + base58 of first 16 bytes of SHA-256(initial public key).
/// Derived once at registration; key rotation never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Compute an agent id from the registration verifying (public) key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let hash = Sha256::digest(key.as_bytes());
        let truncated = &hash[..16];
        let encoded = bs58::encode(truncated).into_string();
        Self(format!("aagt_{encoded}"))
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered agent: identity, declared envelope, keys, trust state.
///
/// Mutated only by the verification pipeline (trust score) and the
/// administrative operations on this type (rotation, compromise marking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    /// Organization that owns this agent.
    pub organization_id: String,
    pub name: String,
    /// Declared capability set.
    pub capabilities: Vec<String>,
    /// Declared MCP server identifiers this agent is authorized to call.
    pub talks_to: Vec<String>,
    /// Current public key (base64).
    pub public_key: String,
    /// Previous public key (base64), kept during the rotation grace window.
    pub previous_public_key: Option<String>,
    /// Deadline of the rotation grace window (microseconds since Unix
    /// epoch). While set and in the future, attestations under the
    /// previous key are still accepted.
    pub key_rotation_grace_until: Option<u64>,
    /// Number of completed key rotations.
    pub rotation_count: u32,
    /// Full rotation history with old-key authorization signatures.
    pub rotation_history: Vec<KeyRotation>,
    /// Set once the agent is known to be compromised; never cleared by
    /// rotation alone.
    pub is_compromised: bool,
    /// Cached current trust score. The authoritative record is the score
    /// history; this is the latest projection.
    pub trust_score: Option<TrustScore>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl AgentRecord {
    /// Register a new agent with the given verifying key.
    pub fn new(
        organization_id: impl Into<String>,
        name: impl Into<String>,
        capabilities: Vec<String>,
        talks_to: Vec<String>,
        verifying_key: &VerifyingKey,
    ) -> Self {
        let now = crate::time::now_micros();
        let public_key = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            verifying_key.to_bytes(),
        );

        Self {
            id: AgentId::from_verifying_key(verifying_key),
            organization_id: organization_id.into(),
            name: name.into(),
            capabilities,
            talks_to,
            public_key,
            previous_public_key: None,
            key_rotation_grace_until: None,
            rotation_count: 0,
            rotation_history: Vec::new(),
            is_compromised: false,
            trust_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The declared operating envelope drift detection compares against.
    pub fn declared_envelope(&self) -> DeclaredEnvelope {
        DeclaredEnvelope {
            mcp_servers: self.talks_to.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    /// Whether the rotation grace window is open at `at`.
    pub fn grace_active(&self, at: u64) -> bool {
        matches!(self.key_rotation_grace_until, Some(deadline) if at <= deadline)
    }

    /// Rotate to a new key.
    ///
    /// The current key moves to `previous_public_key` and stays accepted
    /// for attestations until `grace_micros` from now. The rotation is
    /// authorized by a signature under the *old* key, which must match the
    /// record's current public key.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::InvalidKey` if `old_signing_key` does not match
    /// the current public key, or `TrustError::AgentCompromised` if the
    /// agent has been marked compromised (rotation then requires
    /// re-registration, not a grace window).
    pub fn rotate_key(
        &mut self,
        new_key: &VerifyingKey,
        grace_micros: u64,
        old_signing_key: &SigningKey,
        reason: RotationReason,
    ) -> Result<()> {
        if self.is_compromised {
            return Err(TrustError::AgentCompromised(self.id.0.clone()));
        }

        let old_pub_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            old_signing_key.verifying_key().to_bytes(),
        );
        if old_pub_b64 != self.public_key {
            return Err(TrustError::InvalidKey(
                "rotation must be authorized by the current key".into(),
            ));
        }

        let new_pub_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            new_key.to_bytes(),
        );
        let now = crate::time::now_micros();

        // The old key signs authorization of the rotation
        let auth_message = format!(
            "rotate:{}:{}:{}:{}:{}",
            self.id,
            self.public_key,
            new_pub_b64,
            now,
            reason.as_str()
        );
        let auth_sig = signing::sign_to_base64(old_signing_key, auth_message.as_bytes());

        self.rotation_history.push(KeyRotation {
            previous_key: self.public_key.clone(),
            new_key: new_pub_b64.clone(),
            rotated_at: now,
            reason,
            authorization_signature: auth_sig,
        });

        self.previous_public_key = Some(std::mem::replace(&mut self.public_key, new_pub_b64));
        self.key_rotation_grace_until = Some(now + grace_micros);
        self.rotation_count += 1;
        self.updated_at = now;

        Ok(())
    }

    /// Mark the agent compromised.
    ///
    /// Closes the rotation grace window immediately: a compromised agent's
    /// previous key must not verify anything.
    pub fn mark_compromised(&mut self) {
        self.is_compromised = true;
        self.key_rotation_grace_until = None;
        self.updated_at = crate::time::now_micros();
    }

    /// Verify the authorization signature on one rotation history entry.
    pub fn verify_rotation(&self, rotation: &KeyRotation) -> Result<()> {
        let old_key = signing::decode_verifying_key(&rotation.previous_key)?;
        let auth_message = format!(
            "rotate:{}:{}:{}:{}:{}",
            self.id,
            rotation.previous_key,
            rotation.new_key,
            rotation.rotated_at,
            rotation.reason.as_str()
        );
        signing::verify_from_base64(
            &old_key,
            auth_message.as_bytes(),
            &rotation.authorization_signature,
        )
    }
}

/// Record of one key rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRotation {
    pub previous_key: String,
    pub new_key: String,
    pub rotated_at: u64,
    pub reason: RotationReason,
    pub authorization_signature: String,
}

/// Reason for key rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RotationReason {
    Scheduled,
    Compromised,
    DeviceLost,
    PolicyRequired,
    Manual,
}

impl RotationReason {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Compromised => "compromised",
            Self::DeviceLost => "device_lost",
            Self::PolicyRequired => "policy_required",
            Self::Manual => "manual",
        }
    }
}
