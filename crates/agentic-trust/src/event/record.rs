//! Verification event records.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;
use crate::drift::{DeclaredEnvelope, DriftReport, ObservedSnapshot};
use crate::error::{Result, TrustError};

/// Unique identifier for a verification event.
///
/// Format: `aevt_` + base58 of first 16 bytes of SHA-256 over the event
/// coordinates plus random bytes. Randomized because many events for the
/// same agent can start in the same microsecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    fn derive(agent_id: &AgentId, started_at: u64) -> Self {
        let nonce = crate::crypto::random::random_bytes::<16>();
        let material = format!("event:{}:{}:{}", agent_id.0, started_at, hex::encode(nonce));
        let hash = Sha256::digest(material.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("aevt_{encoded}"))
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol the verification ran over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Mcp,
    A2a,
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mcp => "MCP",
            Self::A2a => "A2A",
        }
    }
}

/// What aspect of the agent was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationType {
    Identity,
    Capability,
    Behavior,
}

impl VerificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Identity => "identity",
            Self::Capability => "capability",
            Self::Behavior => "behavior",
        }
    }
}

/// Event lifecycle state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Pending,
    Success,
    Failure,
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Who initiated the verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiatorType {
    System,
    User,
    Agent,
}

impl InitiatorType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

/// Input to one pipeline run: what the verifier observed and how confident
/// it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub organization_id: String,
    pub agent_id: AgentId,
    pub protocol: Protocol,
    pub verification_type: VerificationType,
    /// Verifier-declared confidence in this observation, in [0,1].
    pub confidence: f64,
    /// How long the verification run took.
    pub duration_ms: u64,
    pub initiator_type: InitiatorType,
    pub started_at: u64,
    /// MCP servers the agent was observed talking to.
    pub current_mcp_servers: Vec<String>,
    /// Capabilities the agent was observed exercising.
    pub current_capabilities: Vec<String>,
}

impl VerificationRequest {
    pub fn observed_snapshot(&self) -> ObservedSnapshot {
        ObservedSnapshot {
            mcp_servers: self.current_mcp_servers.clone(),
            capabilities: self.current_capabilities.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `TrustError::FactorOutOfRange` if the declared confidence
    /// lies outside [0,1].
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) || self.confidence.is_nan() {
            return Err(TrustError::FactorOutOfRange {
                factor: "event_confidence",
                value: self.confidence,
            });
        }
        Ok(())
    }
}

/// A persisted verification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub id: EventId,
    pub organization_id: String,
    pub agent_id: AgentId,
    pub protocol: Protocol,
    pub verification_type: VerificationType,
    pub status: EventStatus,
    pub confidence: f64,
    pub duration_ms: u64,
    pub initiator_type: InitiatorType,
    pub started_at: u64,
    pub completed_at: Option<u64>,
    /// The agent's declared envelope at the time of the event.
    pub declared: DeclaredEnvelope,
    /// What the verifier observed.
    pub observed: ObservedSnapshot,
    pub drift_detected: bool,
    pub mcp_server_drift: Vec<String>,
    pub capability_drift: Vec<String>,
    pub created_at: u64,
}

impl VerificationEvent {
    /// Create a pending event from a request and the agent's declared
    /// envelope.
    pub fn pending(request: &VerificationRequest, declared: DeclaredEnvelope, at: u64) -> Self {
        Self {
            id: EventId::derive(&request.agent_id, request.started_at),
            organization_id: request.organization_id.clone(),
            agent_id: request.agent_id.clone(),
            protocol: request.protocol,
            verification_type: request.verification_type,
            status: EventStatus::Pending,
            confidence: request.confidence,
            duration_ms: request.duration_ms,
            initiator_type: request.initiator_type,
            started_at: request.started_at,
            completed_at: None,
            declared,
            observed: request.observed_snapshot(),
            drift_detected: false,
            mcp_server_drift: Vec::new(),
            capability_drift: Vec::new(),
            created_at: at,
        }
    }

    /// Record the drift outcome on the event.
    pub fn apply_drift(&mut self, report: &DriftReport) {
        self.drift_detected = report.has_drift();
        self.mcp_server_drift = report.mcp_server_drift.clone();
        self.capability_drift = report.capability_drift.clone();
    }

    /// Move the event to a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::EventTerminal` if the event already completed;
    /// terminal states never transition again.
    pub fn complete(&mut self, status: EventStatus, at: u64) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TrustError::EventTerminal(self.id.0.clone()));
        }
        debug_assert!(status.is_terminal());
        self.status = status;
        self.completed_at = Some(at);
        Ok(())
    }
}
