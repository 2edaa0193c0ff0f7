//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Register agents
//! 2. Sign and ingest attestations
//! 3. Run verification events through the pipeline
//! 4. Catch configuration drift and raise an alert
//! 5. Rotate a key and verify under the grace window
//! 6. Issue, refresh, and revoke credentials
//! 7. Sweep expired attestations

use agentic_trust::agent::{AgentRecord, RotationReason};
use agentic_trust::attestation::{
    ingest_attestation, sweep_expired, verify_attestation, AttestationPayload, ConnectionType,
    KeyUsed,
};
use agentic_trust::credential::{CredentialService, RevocationReason};
use agentic_trust::crypto::keys::Ed25519KeyPair;
use agentic_trust::error::TrustError;
use agentic_trust::event::{
    EventStatus, InitiatorType, Protocol, VerificationPipeline, VerificationRequest,
    VerificationType,
};
use agentic_trust::score::{calculate_score, TrustScoreFactors};
use agentic_trust::storage::{AgentStore, AttestationStore, HistoryStore};

fn fresh_payload(agent: &AgentRecord, mcp_name: &str, capabilities: &[&str]) -> AttestationPayload {
    AttestationPayload {
        agent_id: agent.id.0.clone(),
        capabilities_found: capabilities.iter().map(|c| c.to_string()).collect(),
        connection_latency_ms: 18,
        connection_successful: true,
        health_check_passed: true,
        mcp_name: mcp_name.to_string(),
        mcp_url: format!("https://{mcp_name}.example.com/mcp"),
        sdk_version: "0.2.0".to_string(),
        timestamp: agentic_trust::time::micros_to_rfc3339(agentic_trust::time::now_micros()),
    }
}

fn request_for(agent: &AgentRecord, servers: &[&str], capabilities: &[&str]) -> VerificationRequest {
    VerificationRequest {
        organization_id: agent.organization_id.clone(),
        agent_id: agent.id.clone(),
        protocol: Protocol::Mcp,
        verification_type: VerificationType::Behavior,
        confidence: 0.95,
        duration_ms: 150,
        initiator_type: InitiatorType::System,
        started_at: agentic_trust::time::now_micros(),
        current_mcp_servers: servers.iter().map(|s| s.to_string()).collect(),
        current_capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    }
}

#[test]
fn full_workflow_registration_to_revocation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_dir = dir.path();

    // ── Step 1: Register agents ─────────────────────────────────────────
    let agents = AgentStore::new(store_dir).expect("agent store");

    let billing_kp = Ed25519KeyPair::generate();
    let billing = AgentRecord::new(
        "aorg_acme",
        "billing-agent",
        vec!["invoice:read".to_string(), "invoice:write".to_string()],
        vec!["billing".to_string()],
        billing_kp.verifying_key(),
    );
    let support_kp = Ed25519KeyPair::generate();
    let support = AgentRecord::new(
        "aorg_acme",
        "support-agent",
        vec!["ticket:read".to_string()],
        vec!["helpdesk".to_string()],
        support_kp.verifying_key(),
    );

    assert!(billing.id.0.starts_with("aagt_"));
    assert!(support.id.0.starts_with("aagt_"));
    assert_ne!(billing.id, support.id);

    agents.save(&billing).expect("save billing agent");
    agents.save(&support).expect("save support agent");
    assert!(agents.exists(&billing.id));

    // ── Step 2: Sign and ingest attestations ────────────────────────────
    let attestations = AttestationStore::new(store_dir).expect("attestation store");

    let payload_1 = fresh_payload(&billing, "billing", &["invoice:read"]);
    let sig_1 = payload_1.sign(billing_kp.signing_key());
    let outcome_1 =
        ingest_attestation(&attestations, &agents, &payload_1, &sig_1).expect("first ingest");

    assert!(outcome_1.attestation.id.0.starts_with("aatt_"));
    assert!(outcome_1.attestation.signature_verified);
    assert_eq!(outcome_1.attestation.key_used, KeyUsed::Current);
    assert_eq!(outcome_1.connection.connection_type, ConnectionType::Attested);
    assert_eq!(outcome_1.connection.attestation_count, 1);
    assert!(
        (1..=100).contains(&outcome_1.connection.confidence_score),
        "one valid attestation should yield nonzero confidence"
    );

    let payload_2 = fresh_payload(&billing, "billing", &["invoice:read", "invoice:write"]);
    let sig_2 = payload_2.sign(billing_kp.signing_key());
    let outcome_2 =
        ingest_attestation(&attestations, &agents, &payload_2, &sig_2).expect("second ingest");

    assert_eq!(
        outcome_1.connection.id, outcome_2.connection.id,
        "same agent/server pair must reuse the connection row"
    );
    assert_eq!(outcome_2.connection.attestation_count, 2);
    assert!(outcome_2.connection.confidence_score >= outcome_1.connection.confidence_score);

    // ── Step 3: Run a clean verification event ──────────────────────────
    let pipeline = VerificationPipeline::new(store_dir).expect("pipeline stores");
    let factors = TrustScoreFactors::fresh_registration();
    let expected = calculate_score(&factors).expect("factor vector is valid");

    let clean = pipeline
        .run(
            &request_for(&billing, &["billing"], &["invoice:read"]),
            EventStatus::Success,
            &factors,
        )
        .expect("clean pipeline run");

    assert_eq!(clean.event.status, EventStatus::Success);
    assert!(!clean.event.drift_detected);
    assert!(clean.alert.is_none());
    assert!((clean.score.value - expected).abs() < 1e-12);

    let reloaded = agents.load(&billing.id).expect("reload billing agent");
    let stored_score = reloaded.trust_score.expect("score persisted on the record");
    assert!((stored_score.value - clean.score.value).abs() < 1e-12);

    // ── Step 4: Catch drift and raise an alert ──────────────────────────
    let drifted = pipeline
        .run(
            &request_for(
                &billing,
                &["billing", "shadow-exfil"],
                &["invoice:read", "db:admin"],
            ),
            EventStatus::Success,
            &factors,
        )
        .expect("drifted pipeline run");

    assert!(drifted.event.drift_detected);
    assert_eq!(drifted.event.mcp_server_drift, vec!["shadow-exfil"]);
    assert_eq!(drifted.event.capability_drift, vec!["db:admin"]);
    let alert = drifted.alert.as_ref().expect("drift must raise an alert");
    assert!(alert.id.0.starts_with("aalt_"));
    assert!(
        drifted.score.value < clean.score.value,
        "drift must cost trust score"
    );

    let history = HistoryStore::new(store_dir).expect("history store");
    let entries = history.list_for_agent(&billing.id).expect("history entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].previous_score, Some(entries[0].score));
    assert!(entries[1].change_reason.starts_with("verification event aevt_"));

    // ── Step 5: Rotate the key; verify under the grace window ───────────
    let old_payload = fresh_payload(&billing, "billing", &["invoice:read"]);
    let old_sig = old_payload.sign(billing_kp.signing_key());

    let mut rotated = agents.load(&billing.id).expect("reload for rotation");
    let new_kp = Ed25519KeyPair::generate();
    rotated
        .rotate_key(
            new_kp.verifying_key(),
            3_600_000_000,
            billing_kp.signing_key(),
            RotationReason::Scheduled,
        )
        .expect("rotation authorized by the current key");
    agents.save(&rotated).expect("save rotated agent");

    let grace_outcome = ingest_attestation(&attestations, &agents, &old_payload, &old_sig)
        .expect("old key accepted inside the grace window");
    assert_eq!(grace_outcome.attestation.key_used, KeyUsed::Previous);

    let new_payload = fresh_payload(&rotated, "billing", &["invoice:write"]);
    let new_sig = new_payload.sign(new_kp.signing_key());
    let current_outcome = ingest_attestation(&attestations, &agents, &new_payload, &new_sig)
        .expect("new key accepted after rotation");
    assert_eq!(current_outcome.attestation.key_used, KeyUsed::Current);

    // ── Step 6: Issue, refresh, and revoke credentials ──────────────────
    let service = CredentialService::new(store_dir).expect("credential service");

    let issued = service
        .issue(&billing.id, "ci-runner-7")
        .expect("issue root credential");
    assert!(issued.credential.id.0.starts_with("acrd_"));
    assert_eq!(issued.credential.rotation_count, 0);

    let first = service.refresh(&issued.token).expect("first refresh");
    assert_eq!(first.credential.rotation_count, 1);
    assert_eq!(first.response.token_type, "Bearer");
    assert_eq!(first.response.expires_in, 86_400);

    let second = service
        .refresh(&first.response.refresh_credential)
        .expect("second refresh");
    assert_eq!(second.credential.rotation_count, 2);

    // The parent chain stays valid until explicitly revoked.
    let root_record = service
        .store()
        .load(&issued.credential.id)
        .expect("root still on disk");
    assert!(!root_record.revoked);

    let lineage = service
        .lineage(&second.credential.id)
        .expect("lineage of the newest credential");
    assert_eq!(lineage.ancestry.len(), 3, "root, child, grandchild");
    assert_eq!(lineage.ancestry[0].id, issued.credential.id);

    let revoked = service
        .revoke(&issued.credential.id, RevocationReason::Compromised, true)
        .expect("cascade revoke from the root");
    assert_eq!(revoked.len(), 3, "root and both descendants");

    let err = service
        .refresh(&second.response.refresh_credential)
        .expect_err("revoked credential must not refresh");
    assert!(matches!(err, TrustError::CredentialRevoked(_)));

    // ── Step 7: Sweep expired attestations ──────────────────────────────
    // Verify one attestation against a clock 25 hours in the past so its
    // validity window has already closed.
    let stale_payload = fresh_payload(&rotated, "billing", &["invoice:read"]);
    let stale_sig = stale_payload.sign(new_kp.signing_key());
    let past = agentic_trust::time::now_micros() - 25 * 3600 * 1_000_000;
    let stale = verify_attestation(&stale_payload, &stale_sig, &rotated, past)
        .expect("verification against a past clock");
    attestations
        .save_attestation(&stale)
        .expect("save stale attestation");

    let report = sweep_expired(&attestations).expect("sweep");
    assert_eq!(report.scanned, 5, "four live ingests plus the stale record");
    assert_eq!(report.invalidated, 1);

    let swept = attestations
        .load_attestation(&stale.id)
        .expect("stale record still on disk");
    assert!(!swept.is_valid);
    assert!(swept.invalidated_at.is_some());

    // A second sweep finds nothing left to invalidate.
    let again = sweep_expired(&attestations).expect("second sweep");
    assert_eq!(again.invalidated, 0);
}

#[test]
fn workflow_score_history_chains_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_dir = dir.path();

    let agents = AgentStore::new(store_dir).expect("agent store");
    let kp = Ed25519KeyPair::generate();
    let agent = AgentRecord::new(
        "aorg_acme",
        "chained-agent",
        vec!["report:read".to_string()],
        vec!["reports".to_string()],
        kp.verifying_key(),
    );
    agents.save(&agent).expect("save agent");

    let pipeline = VerificationPipeline::new(store_dir).expect("pipeline stores");
    let factors = TrustScoreFactors::fresh_registration();

    let mut confidences = Vec::new();
    for _ in 0..3 {
        let outcome = pipeline
            .run(
                &request_for(&agent, &["reports"], &["report:read"]),
                EventStatus::Success,
                &factors,
            )
            .expect("pipeline run");
        confidences.push(outcome.score.confidence);
    }

    let history = HistoryStore::new(store_dir).expect("history store");
    let entries = history.list_for_agent(&agent.id).expect("entries");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].previous_score, None);
    assert_eq!(entries[1].previous_score, Some(entries[0].score));
    assert_eq!(entries[2].previous_score, Some(entries[1].score));

    assert!(
        confidences[2] > confidences[0],
        "confidence must grow with verification activity"
    );
}

#[test]
fn workflow_compromised_agent_verifies_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_dir = dir.path();

    let agents = AgentStore::new(store_dir).expect("agent store");
    let attestations = AttestationStore::new(store_dir).expect("attestation store");

    let kp = Ed25519KeyPair::generate();
    let mut agent = AgentRecord::new(
        "aorg_acme",
        "stolen-agent",
        vec!["invoice:read".to_string()],
        vec!["billing".to_string()],
        kp.verifying_key(),
    );
    agents.save(&agent).expect("save agent");

    // A valid signature ingests fine before the compromise.
    let payload = fresh_payload(&agent, "billing", &["invoice:read"]);
    let sig = payload.sign(kp.signing_key());
    ingest_attestation(&attestations, &agents, &payload, &sig).expect("pre-compromise ingest");

    agent.mark_compromised();
    agents.save(&agent).expect("save compromised agent");

    // The same key now verifies nothing, and rotation is refused too.
    let payload = fresh_payload(&agent, "billing", &["invoice:read"]);
    let sig = payload.sign(kp.signing_key());
    let err = ingest_attestation(&attestations, &agents, &payload, &sig)
        .expect_err("compromised agent must not attest");
    assert!(matches!(err, TrustError::AgentCompromised(_)));

    let next = Ed25519KeyPair::generate();
    let err = agent
        .rotate_key(
            next.verifying_key(),
            3_600_000_000,
            kp.signing_key(),
            RotationReason::Compromised,
        )
        .expect_err("compromised agent cannot rotate in place");
    assert!(matches!(err, TrustError::AgentCompromised(_)));
}
