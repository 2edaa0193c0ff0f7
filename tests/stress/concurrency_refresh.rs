//! Concurrency test: parallel credential issuance and refresh chains.
//!
//! All threads share one store directory, but each works on its own
//! credential family, so no two threads ever write the same file.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use agentic_trust::agent::AgentId;
use agentic_trust::credential::CredentialService;

#[test]
fn stress_50_threads_refresh_own_chains() {
    let dir = tempfile::tempdir().unwrap();
    let base: PathBuf = dir.path().to_path_buf();
    let chain_depth = 10;

    let mut handles = Vec::new();
    for thread_id in 0..50 {
        let base = base.clone();
        let handle = thread::spawn(move || {
            let service = CredentialService::new(&base).expect("service should open");
            let agent = AgentId(format!("aagt_thread_{thread_id}"));

            let issued = service
                .issue(&agent, &format!("device-{thread_id}"))
                .expect("issue should succeed");

            let mut token = issued.token;
            let mut last_rotation = issued.credential.rotation_count;
            for _ in 0..chain_depth {
                let outcome = service.refresh(&token).expect("refresh should succeed");
                last_rotation = outcome.credential.rotation_count;
                token = outcome.response.refresh_credential;
            }
            last_rotation
        });
        handles.push(handle);
    }

    for h in handles {
        let final_rotation = h.join().unwrap();
        assert_eq!(final_rotation, chain_depth);
    }

    // 50 roots plus 50 chains of 10 children each.
    let service = CredentialService::new(&base).unwrap();
    let all = service.store().list().unwrap();
    assert_eq!(all.len(), 50 * (chain_depth as usize + 1));
}

#[test]
fn stress_concurrent_issue_mints_distinct_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let base: PathBuf = dir.path().to_path_buf();
    let ids = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for thread_id in 0..16 {
        let base = base.clone();
        let ids = Arc::clone(&ids);
        let handle = thread::spawn(move || {
            let service = CredentialService::new(&base).expect("service should open");
            let agent = AgentId(format!("aagt_issuer_{thread_id}"));
            for i in 0..25 {
                let issued = service
                    .issue(&agent, &format!("device-{thread_id}-{i}"))
                    .expect("issue should succeed");
                ids.lock().unwrap().push(issued.credential.id);
            }
        });
        handles.push(handle);
    }

    for h in handles {
        h.join().unwrap();
    }

    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), 400);
    let distinct: HashSet<_> = ids.iter().cloned().collect();
    assert_eq!(distinct.len(), 400, "credential ids must never collide");
}

#[test]
fn stress_concurrent_lineage_readers() {
    let dir = tempfile::tempdir().unwrap();
    let base: PathBuf = dir.path().to_path_buf();

    // Build one chain of depth 20 up front; readers never write.
    let service = CredentialService::new(&base).unwrap();
    let agent = AgentId("aagt_read_target".to_string());
    let issued = service.issue(&agent, "shared-device").unwrap();

    let mut token = issued.token;
    let mut leaf = issued.credential.id.clone();
    for _ in 0..20 {
        let outcome = service.refresh(&token).unwrap();
        leaf = outcome.credential.id.clone();
        token = outcome.response.refresh_credential;
    }

    let root = issued.credential.id;
    let leaf = Arc::new(leaf);
    let root = Arc::new(root);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let base = base.clone();
        let leaf = Arc::clone(&leaf);
        let root = Arc::clone(&root);
        let handle = thread::spawn(move || {
            let service = CredentialService::new(&base).expect("service should open");
            for _ in 0..50 {
                let lineage = service.lineage(&leaf).expect("lineage should resolve");
                assert_eq!(lineage.ancestry.len(), 21, "root plus 20 refreshes");
                assert_eq!(lineage.ancestry[0].id, *root);

                let from_root = service.lineage(&root).expect("lineage should resolve");
                assert_eq!(from_root.descendants.len(), 20);
            }
        });
        handles.push(handle);
    }

    for h in handles {
        h.join().unwrap();
    }
}
