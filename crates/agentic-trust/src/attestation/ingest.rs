//! Attestation ingestion.
//!
//! Ingestion is the write path behind `attest verify`: verify the signature
//! against the agent record, persist the attestation, and upsert the
//! connection for its (agent, server url) pair. If the connection cannot be
//! written, the attestation written earlier in the same ingest is removed
//! again so a retry starts clean.

use crate::agent::AgentId;
use crate::attestation::confidence;
use crate::attestation::connection::{AgentMcpConnection, ConnectionId, ConnectionType};
use crate::attestation::payload::AttestationPayload;
use crate::attestation::record::{AttestationId, McpAttestation};
use crate::attestation::verifier;
use crate::error::{Result, TrustError};
use crate::storage::{AgentStore, AttestationStore};

/// What one successful ingest produced.
#[derive(Debug)]
pub struct IngestOutcome {
    pub attestation: McpAttestation,
    pub connection: AgentMcpConnection,
}

/// Verify and persist one signed attestation.
///
/// Re-ingesting an identical signed payload lands on the same attestation
/// file (ids are deterministic), so retries never duplicate records; the
/// connection's `attestation_count` counts presentations, while the
/// confidence score is recomputed from the valid records on disk.
///
/// # Errors
///
/// `TrustError::UnknownAgent` if the payload names an unregistered agent;
/// otherwise the verification errors of
/// [`verifier::verify_attestation`] or storage errors.
pub fn ingest_attestation(
    store: &AttestationStore,
    agents: &AgentStore,
    payload: &AttestationPayload,
    signature_b64: &str,
) -> Result<IngestOutcome> {
    let agent = agents.load(&AgentId(payload.agent_id.clone()))?;
    let now = crate::time::now_micros();

    let attestation = verifier::verify_attestation(payload, signature_b64, &agent, now)?;
    store.save_attestation(&attestation)?;

    let connection_id = ConnectionId::derive(&agent.id, &payload.mcp_url);
    let mut connection = match store.load_connection(&connection_id) {
        Ok(Some(existing)) => existing,
        Ok(None) => AgentMcpConnection::new(
            agent.id.clone(),
            payload.mcp_name.clone(),
            payload.mcp_url.clone(),
            ConnectionType::Attested,
            now,
        ),
        Err(e) => {
            undo_attestation(store, &attestation.id);
            return Err(e);
        }
    };
    connection.record_attestation(now);

    match connection_evidence(store, &agent.id, &payload.mcp_url, now) {
        Ok((valid_count, newest)) => {
            connection.confidence_score =
                confidence::connection_confidence(valid_count, newest, now);
        }
        Err(e) => {
            undo_attestation(store, &attestation.id);
            return Err(e);
        }
    }

    if let Err(e) = store.save_connection(&connection) {
        undo_attestation(store, &attestation.id);
        return Err(e);
    }

    log::debug!(
        "ingested attestation {} for {} (connection {}, confidence {})",
        attestation.id,
        agent.id,
        connection.id,
        connection.confidence_score
    );

    Ok(IngestOutcome {
        attestation,
        connection,
    })
}

/// Count the currently valid attestations for one (agent, url) pair and
/// find the verification instant of the newest.
///
/// Records swept away mid-scan are skipped, not treated as errors.
pub fn connection_evidence(
    store: &AttestationStore,
    agent_id: &AgentId,
    mcp_url: &str,
    now: u64,
) -> Result<(u64, Option<u64>)> {
    let mut valid_count = 0u64;
    let mut newest: Option<u64> = None;

    for id in store.list_attestations()? {
        let attestation = match store.load_attestation(&id) {
            Ok(a) => a,
            Err(TrustError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        if attestation.agent_id != *agent_id || attestation.payload.mcp_url != mcp_url {
            continue;
        }
        if !attestation.is_valid || attestation.is_expired(now) {
            continue;
        }

        valid_count += 1;
        newest = Some(match newest {
            Some(n) => n.max(attestation.verified_at),
            None => attestation.verified_at,
        });
    }

    Ok((valid_count, newest))
}

fn undo_attestation(store: &AttestationStore, id: &AttestationId) {
    if let Err(e) = store.delete_attestation(id) {
        log::warn!("ingest rollback: could not remove attestation {id}: {e}");
    }
}
