//! Attestation verification and lifecycle.
//!
//! An attestation is a signed claim by an agent SDK about one live
//! connection to an MCP server. This module owns the whole path: the
//! canonical payload encoding ([`payload`]), signature verification against
//! the agent's current or grace-window key ([`verifier`]), the stored
//! record and its validity window ([`record`]), the standing connection
//! rows attestation evidence feeds ([`connection`], [`confidence`]), the
//! ingestion write path ([`ingest`]), and the periodic expiry sweep
//! ([`sweep`]).

pub mod confidence;
pub mod connection;
pub mod ingest;
pub mod payload;
pub mod record;
pub mod sweep;
pub mod verifier;

pub use confidence::connection_confidence;
pub use connection::{AgentMcpConnection, ConnectionId, ConnectionType};
pub use ingest::{connection_evidence, ingest_attestation, IngestOutcome};
pub use payload::AttestationPayload;
pub use record::{AttestationId, KeyUsed, McpAttestation, ATTESTATION_VALIDITY_MICROS};
pub use sweep::{sweep_expired, SweepReport};
pub use verifier::verify_attestation;
