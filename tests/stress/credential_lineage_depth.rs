//! Stress test: refresh a credential chain to depth 50 and walk its
//! lineage; cascade a revocation across the whole family.

use agentic_trust::agent::AgentId;
use agentic_trust::credential::{CredentialService, RevocationReason};

#[test]
fn stress_credential_chain_depth_50() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();
    let chain_depth = 50u32;

    let agent = AgentId("aagt_deep_chain".to_string());
    let issued = service
        .issue(&agent, "long-lived-device")
        .expect("issue should succeed");

    let mut token = issued.token;
    let mut leaf = issued.credential.id.clone();
    for step in 1..=chain_depth {
        let outcome = service.refresh(&token).expect("refresh should succeed");
        assert_eq!(outcome.credential.rotation_count, step);
        leaf = outcome.credential.id.clone();
        token = outcome.response.refresh_credential;
    }

    // Ancestry runs root-first and includes the requested credential.
    let lineage = service.lineage(&leaf).expect("lineage should resolve");
    assert_eq!(lineage.ancestry.len(), chain_depth as usize + 1);
    assert_eq!(lineage.ancestry[0].id, issued.credential.id);
    assert_eq!(lineage.ancestry.last().unwrap().id, leaf);
    for (depth, credential) in lineage.ancestry.iter().enumerate() {
        assert_eq!(credential.rotation_count, depth as u32);
    }
    assert!(
        lineage.descendants.is_empty(),
        "the leaf has no descendants"
    );

    // Seen from the root, the whole chain is descendants.
    let from_root = service
        .lineage(&issued.credential.id)
        .expect("lineage should resolve");
    assert_eq!(from_root.ancestry.len(), 1);
    assert_eq!(from_root.descendants.len(), chain_depth as usize);
}

#[test]
fn stress_cascade_revocation_depth_50() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();

    let agent = AgentId("aagt_cascade".to_string());
    let issued = service.issue(&agent, "doomed-device").unwrap();

    let mut token = issued.token;
    for _ in 0..50 {
        let outcome = service.refresh(&token).unwrap();
        token = outcome.response.refresh_credential;
    }

    let revoked = service
        .revoke(&issued.credential.id, RevocationReason::Compromised, true)
        .expect("cascade revoke should succeed");
    assert_eq!(revoked.len(), 51, "root plus 50 descendants");

    // The root keeps the caller's reason; descendants are marked as
    // cascade casualties.
    let root = service.store().load(&issued.credential.id).unwrap();
    assert!(root.revoked);
    assert_eq!(root.revocation_reason, Some(RevocationReason::Compromised));

    for id in revoked.iter().filter(|id| **id != issued.credential.id) {
        let record = service.store().load(id).unwrap();
        assert!(record.revoked);
        assert_eq!(record.revocation_reason, Some(RevocationReason::Cascade));
    }

    // Nothing in the chain refreshes anymore.
    let err = service.refresh(&token).expect_err("leaf token is dead");
    assert!(matches!(
        err,
        agentic_trust::error::TrustError::CredentialRevoked(_)
    ));
}

#[test]
fn stress_wide_fanout_50_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let service = CredentialService::new(dir.path()).unwrap();

    let agent = AgentId("aagt_fanout".to_string());
    let issued = service.issue(&agent, "shared-refresh-device").unwrap();

    // The same refresh credential presented 50 times mints 50 siblings;
    // the parent stays valid throughout.
    let mut siblings = Vec::new();
    for _ in 0..50 {
        let outcome = service.refresh(&issued.token).expect("refresh should succeed");
        assert_eq!(outcome.credential.rotation_count, 1);
        assert_eq!(outcome.credential.parent_id, Some(issued.credential.id.clone()));
        siblings.push(outcome.credential.id);
    }

    let parent = service.store().load(&issued.credential.id).unwrap();
    assert!(!parent.revoked);
    assert_eq!(parent.use_count, 50);

    let lineage = service.lineage(&issued.credential.id).unwrap();
    assert_eq!(lineage.descendants.len(), 50);
    for sibling in &siblings {
        assert!(lineage.descendants.iter().any(|c| c.id == *sibling));
    }

    // Revoking the parent with cascade takes every sibling down at once.
    let revoked = service
        .revoke(
            &issued.credential.id,
            RevocationReason::PolicyViolation,
            true,
        )
        .unwrap();
    assert_eq!(revoked.len(), 51);
}
