//! AgenticTrust — Trust and attestation engine for AI agents.
//!
//! Provides weighted trust scoring, signed MCP connection attestations
//! with key-rotation grace windows, configuration drift detection,
//! verification event orchestration, and rotating credential lineages
//! for AI agents operating via MCP and A2A.

pub mod agent;
pub mod alert;
pub mod attestation;
pub mod credential;
pub mod crypto;
pub mod drift;
pub mod error;
pub mod event;
pub mod score;
pub mod storage;
pub mod time;

// Re-export primary types
pub use error::{Result, TrustError};
pub use score::{calculate_score, TrustFactor, TrustScore, TrustScoreFactors, TrustScoreHistoryEntry};

// Re-export agent types
pub use agent::{AgentId, AgentRecord, KeyRotation, RotationReason};

// Re-export attestation types
pub use attestation::{
    ingest_attestation, sweep_expired, verify_attestation, AgentMcpConnection, AttestationId,
    AttestationPayload, ConnectionId, ConnectionType, IngestOutcome, KeyUsed, McpAttestation,
    SweepReport,
};

// Re-export drift and alert types
pub use alert::{Alert, AlertId, AlertSeverity, AlertType};
pub use drift::{detect_drift, DeclaredEnvelope, DriftReport, ObservedSnapshot};

// Re-export event types
pub use event::{
    EventId, EventStatus, InitiatorType, PipelineOutcome, Protocol, VerificationEvent,
    VerificationPipeline, VerificationRequest, VerificationType,
};

// Re-export credential types
pub use credential::{
    Credential, CredentialId, CredentialLineage, CredentialService, IssuedCredential,
    RefreshOutcome, RefreshResponse, RevocationReason,
};
