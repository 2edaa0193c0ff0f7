//! Attestation signature verification.

use crate::agent::AgentRecord;
use crate::attestation::payload::AttestationPayload;
use crate::attestation::record::{KeyUsed, McpAttestation};
use crate::crypto::signing;
use crate::error::{Result, TrustError};

/// Verify a signed attestation against an agent record.
///
/// The signature must cover the canonical payload bytes. The agent's current
/// key is always tried; during a rotation grace window the previous key is
/// also accepted, but only for payloads timestamped before the grace
/// deadline. A compromised agent verifies nothing, under either key.
///
/// # Errors
///
/// - `TrustError::MalformedPayload` for structural problems, including a
///   payload that names a different agent than the record.
/// - `TrustError::AgentCompromised` when the agent is marked compromised.
/// - `TrustError::SignatureInvalid` when no acceptable key verifies the
///   signature. Deliberately a hard failure with no partial trust.
pub fn verify_attestation(
    payload: &AttestationPayload,
    signature_b64: &str,
    agent: &AgentRecord,
    now: u64,
) -> Result<McpAttestation> {
    payload.validate()?;

    if payload.agent_id != agent.id.0 {
        return Err(TrustError::MalformedPayload(format!(
            "payload names {} but record is {}",
            payload.agent_id, agent.id
        )));
    }
    if agent.is_compromised {
        return Err(TrustError::AgentCompromised(agent.id.0.clone()));
    }

    let canonical = payload.canonical_json();
    let key_used = verify_with_agent_keys(agent, canonical.as_bytes(), signature_b64, payload, now)?;

    Ok(McpAttestation::verified(
        agent.id.clone(),
        payload.clone(),
        signature_b64.to_string(),
        key_used,
        now,
    ))
}

fn verify_with_agent_keys(
    agent: &AgentRecord,
    canonical: &[u8],
    signature_b64: &str,
    payload: &AttestationPayload,
    now: u64,
) -> Result<KeyUsed> {
    let current = signing::decode_verifying_key(&agent.public_key)?;
    if signing::verify_from_base64(&current, canonical, signature_b64).is_ok() {
        return Ok(KeyUsed::Current);
    }

    if let (Some(previous_b64), Some(grace_until)) =
        (&agent.previous_public_key, agent.key_rotation_grace_until)
    {
        // Previous key only counts inside the grace window, and only for
        // payloads the SDK produced before the window closes.
        let payload_at = payload.timestamp_micros()?;
        if now <= grace_until && payload_at <= grace_until {
            let previous = signing::decode_verifying_key(previous_b64)?;
            if signing::verify_from_base64(&previous, canonical, signature_b64).is_ok() {
                return Ok(KeyUsed::Previous);
            }
        }
    }

    Err(TrustError::SignatureInvalid)
}
