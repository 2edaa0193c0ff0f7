//! Edge case tests: factor bounds, confidence saturation, drift direction,
//! unicode payloads, timestamp offsets, credential refresh failure modes.

use agentic_trust::agent::{AgentId, AgentRecord};
use agentic_trust::attestation::{verify_attestation, AttestationPayload};
use agentic_trust::credential::{CredentialService, RevocationReason};
use agentic_trust::crypto::keys::Ed25519KeyPair;
use agentic_trust::drift::{detect_drift, DeclaredEnvelope, ObservedSnapshot};
use agentic_trust::error::TrustError;
use agentic_trust::event::{
    InitiatorType, Protocol, VerificationRequest, VerificationType,
};
use agentic_trust::score::{
    calculate_score, confidence_from_activity, TrustFactor, TrustScoreFactors,
};

// === Score Edge Cases ===

fn factors_all(value: f64) -> TrustScoreFactors {
    TrustScoreFactors {
        verification: value,
        uptime: value,
        success_rate: value,
        alert_posture: value,
        compliance: value,
        account_age: value,
        drift_freedom: value,
        user_feedback: value,
    }
}

#[test]
fn edge_factor_just_outside_range_rejected() {
    let mut factors = factors_all(0.5);
    factors.uptime = 1.0 + 1e-9;
    assert!(matches!(
        calculate_score(&factors),
        Err(TrustError::FactorOutOfRange {
            factor: "uptime",
            ..
        })
    ));

    factors.uptime = -1e-9;
    assert!(calculate_score(&factors).is_err());
}

#[test]
fn edge_nan_factor_rejected() {
    let mut factors = factors_all(0.5);
    factors.user_feedback = f64::NAN;
    assert!(matches!(
        calculate_score(&factors),
        Err(TrustError::FactorOutOfRange { .. })
    ));
}

#[test]
fn edge_boundary_factors_accepted() {
    assert!(calculate_score(&factors_all(0.0)).unwrap().abs() < 1e-12);
    assert!((calculate_score(&factors_all(1.0)).unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn edge_factor_weights_sum_to_one() {
    let total: f64 = TrustFactor::ALL.iter().map(|f| f.weight()).sum();
    assert!(
        (total - 1.0).abs() < 1e-12,
        "weights must sum to 1.0, got {total}"
    );
}

#[test]
fn edge_single_factor_moves_score_by_its_weight() {
    let baseline = calculate_score(&factors_all(1.0)).unwrap();
    let mut factors = factors_all(1.0);
    factors.drift_freedom = 0.0;
    let dropped = calculate_score(&factors).unwrap();
    assert!(
        (baseline - dropped - TrustFactor::DriftFreedom.weight()).abs() < 1e-12,
        "zeroing one factor should cost exactly its weight"
    );
}

#[test]
fn edge_confidence_saturates_at_twenty_events() {
    let now = 1_700_000_000_000_000;
    let at_saturation = confidence_from_activity(20, Some(now), now);
    let far_beyond = confidence_from_activity(2_000, Some(now), now);
    assert!((at_saturation - 1.0).abs() < 1e-12);
    assert!((far_beyond - 1.0).abs() < 1e-12, "confidence is capped at 1.0");
}

#[test]
fn edge_confidence_neutral_without_activity() {
    let now = 1_700_000_000_000_000;
    assert_eq!(confidence_from_activity(0, None, now), 0.5);
    assert_eq!(confidence_from_activity(7, None, now), 0.5);
    assert_eq!(confidence_from_activity(0, Some(now), now), 0.5);
}

// === Drift Edge Cases ===

fn envelope(servers: &[&str], caps: &[&str]) -> DeclaredEnvelope {
    DeclaredEnvelope {
        mcp_servers: servers.iter().map(|s| s.to_string()).collect(),
        capabilities: caps.iter().map(|s| s.to_string()).collect(),
    }
}

fn snapshot(servers: &[&str], caps: &[&str]) -> ObservedSnapshot {
    ObservedSnapshot {
        mcp_servers: servers.iter().map(|s| s.to_string()).collect(),
        capabilities: caps.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn edge_drift_is_one_directional() {
    // A mostly idle agent is not drifting, no matter how much it declared.
    let report = detect_drift(
        &envelope(&["a", "b", "c", "d"], &["r", "w", "x"]),
        &snapshot(&["a"], &[]),
    );
    assert!(!report.has_drift());
}

#[test]
fn edge_drift_matches_exact_strings() {
    // Envelope comparison is literal: a case difference is drift.
    let report = detect_drift(&envelope(&["Billing"], &[]), &snapshot(&["billing"], &[]));
    assert_eq!(report.mcp_server_drift, vec!["billing"]);
}

#[test]
fn edge_drift_empty_both_sides() {
    let report = detect_drift(&envelope(&[], &[]), &snapshot(&[], &[]));
    assert!(!report.has_drift());
    assert!(report.drifted_items().is_empty());
}

// === Attestation Edge Cases ===

fn agent_with_key() -> (AgentRecord, Ed25519KeyPair) {
    let kp = Ed25519KeyPair::generate();
    let agent = AgentRecord::new(
        "aorg_edge",
        "edge-agent",
        vec!["invoice:read".to_string()],
        vec!["billing".to_string()],
        kp.verifying_key(),
    );
    (agent, kp)
}

fn payload_for(agent: &AgentRecord) -> AttestationPayload {
    AttestationPayload {
        agent_id: agent.id.0.clone(),
        capabilities_found: vec!["invoice:read".to_string()],
        connection_latency_ms: 5,
        connection_successful: true,
        health_check_passed: true,
        mcp_name: "billing".to_string(),
        mcp_url: "https://billing.example.com/mcp".to_string(),
        sdk_version: "0.2.0".to_string(),
        timestamp: agentic_trust::time::micros_to_rfc3339(agentic_trust::time::now_micros()),
    }
}

#[test]
fn edge_unicode_payload_fields_verify() {
    let (agent, kp) = agent_with_key();
    let mut payload = payload_for(&agent);
    payload.mcp_name = "Rechnungs-Server (östlich) — 請求".to_string();
    payload.capabilities_found = vec!["facture:lire".to_string(), "支払い:読む".to_string()];

    let signature = payload.sign(kp.signing_key());
    let record = verify_attestation(&payload, &signature, &agent, agentic_trust::time::now_micros())
        .expect("unicode fields should sign and verify");
    assert_eq!(record.payload.mcp_name, payload.mcp_name);
}

#[test]
fn edge_empty_capability_list_is_valid() {
    let (agent, kp) = agent_with_key();
    let mut payload = payload_for(&agent);
    payload.capabilities_found.clear();

    let signature = payload.sign(kp.signing_key());
    assert!(verify_attestation(
        &payload,
        &signature,
        &agent,
        agentic_trust::time::now_micros()
    )
    .is_ok());
}

#[test]
fn edge_future_timestamp_tolerated() {
    // SDK clocks run ahead of the verifier's all the time; a skewed
    // timestamp parses and verifies like any other.
    let (agent, kp) = agent_with_key();
    let mut payload = payload_for(&agent);
    payload.timestamp = agentic_trust::time::micros_to_rfc3339(
        agentic_trust::time::now_micros() + 3_600_000_000,
    );

    let signature = payload.sign(kp.signing_key());
    assert!(verify_attestation(
        &payload,
        &signature,
        &agent,
        agentic_trust::time::now_micros()
    )
    .is_ok());
}

#[test]
fn edge_timestamp_offset_equivalence() {
    // +05:30 and Z spellings of the same instant parse to the same micros.
    let utc = agentic_trust::time::rfc3339_to_micros("2026-01-15T10:30:00Z").unwrap();
    let offset = agentic_trust::time::rfc3339_to_micros("2026-01-15T16:00:00+05:30").unwrap();
    assert_eq!(utc, offset);
}

// === Event Edge Cases ===

#[test]
fn edge_event_confidence_bounds_inclusive() {
    let mut request = VerificationRequest {
        organization_id: "aorg_edge".to_string(),
        agent_id: AgentId("aagt_edge".to_string()),
        protocol: Protocol::A2a,
        verification_type: VerificationType::Identity,
        confidence: 0.0,
        duration_ms: 0,
        initiator_type: InitiatorType::User,
        started_at: 1,
        current_mcp_servers: Vec::new(),
        current_capabilities: Vec::new(),
    };
    assert!(request.validate().is_ok(), "0.0 is inside the range");

    request.confidence = 1.0;
    assert!(request.validate().is_ok(), "1.0 is inside the range");

    request.confidence = 1.0 + 1e-9;
    assert!(request.validate().is_err());
}

// === Credential Edge Cases ===

#[test]
fn edge_empty_token_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();
    let err = service.refresh("").expect_err("empty token must fail");
    assert!(matches!(err, TrustError::MalformedPayload(_)));
}

#[test]
fn edge_unknown_token_reported_as_revoked() {
    // A guessed token must be indistinguishable from a revoked one, so
    // probing the refresh endpoint leaks nothing about which hashes exist.
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();
    let err = service
        .refresh("bm90LWEtcmVhbC10b2tlbi1hdC1hbGw=")
        .expect_err("unknown token must fail");
    assert!(matches!(err, TrustError::CredentialRevoked(_)));
}

#[test]
fn edge_double_revocation_keeps_original_reason() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();
    let agent = AgentId("aagt_double_revoke".to_string());

    let issued = service.issue(&agent, "flaky-device").unwrap();
    service
        .revoke(&issued.credential.id, RevocationReason::ManualRevocation, false)
        .unwrap();
    let first = service.store().load(&issued.credential.id).unwrap();

    // A second revocation with a scarier reason must not rewrite history.
    service
        .revoke(&issued.credential.id, RevocationReason::Compromised, false)
        .unwrap();
    let second = service.store().load(&issued.credential.id).unwrap();

    assert_eq!(
        second.revocation_reason,
        Some(RevocationReason::ManualRevocation)
    );
    assert_eq!(second.revoked_at, first.revoked_at);
}

#[test]
fn edge_revoke_without_cascade_spares_children() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();
    let agent = AgentId("aagt_sparing".to_string());

    let issued = service.issue(&agent, "parent-device").unwrap();
    let child = service.refresh(&issued.token).unwrap();

    let revoked = service
        .revoke(&issued.credential.id, RevocationReason::PolicyViolation, false)
        .unwrap();
    assert_eq!(revoked, vec![issued.credential.id]);

    let surviving = service.store().load(&child.credential.id).unwrap();
    assert!(!surviving.revoked, "children survive a non-cascade revoke");
}
