//! Resilience tests: corrupted key files, wrong passphrases, tampered
//! ciphertext, and damaged store records.

use agentic_trust::agent::{AgentId, AgentRecord};
use agentic_trust::crypto::keys::Ed25519KeyPair;
use agentic_trust::error::TrustError;
use agentic_trust::storage::{load_agent_key, read_public_info, save_agent_key, AgentStore};

fn agent_id(name: &str) -> AgentId {
    AgentId(format!("aagt_resilience_{name}"))
}

#[test]
fn resilience_corrupted_atk_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("corrupted.atk");

    let keypair = Ed25519KeyPair::generate();
    save_agent_key(&keypair, &agent_id("corrupted"), &path, "test_pass").unwrap();

    // Corrupt the file by flipping bytes in the middle
    {
        let mut data = std::fs::read(&path).unwrap();
        if data.len() > 50 {
            for item in data.iter_mut().take(50).skip(40) {
                *item ^= 0xFF;
            }
        }
        std::fs::write(&path, data).unwrap();
    }

    let result = load_agent_key(&path, "test_pass");
    assert!(result.is_err(), "Corrupted file should fail to load");
}

#[test]
fn resilience_wrong_passphrase_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("passphrase-test.atk");

    let keypair = Ed25519KeyPair::generate();
    save_agent_key(&keypair, &agent_id("passphrase"), &path, "correct_password").unwrap();

    let result = load_agent_key(&path, "wrong_password");
    assert!(
        matches!(result, Err(TrustError::InvalidPassphrase)),
        "Wrong passphrase should fail with InvalidPassphrase"
    );
}

#[test]
fn resilience_tampered_ciphertext_reads_as_wrong_passphrase() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tampered.atk");

    let keypair = Ed25519KeyPair::generate();
    save_agent_key(&keypair, &agent_id("tampered"), &path, "right_pass").unwrap();

    // Flip one ciphertext byte while leaving the rest of the file intact.
    {
        let mut file: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let mut ciphertext = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            file["encrypted_key"].as_str().unwrap(),
        )
        .unwrap();
        ciphertext[0] ^= 0x01;
        file["encrypted_key"] = serde_json::Value::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &ciphertext,
        ));
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();
    }

    // AEAD authentication cannot tell a tampered blob from a wrong key, so
    // the correct passphrase now reports InvalidPassphrase.
    let result = load_agent_key(&path, "right_pass");
    assert!(matches!(result, Err(TrustError::InvalidPassphrase)));

    // The plaintext public section is still readable for triage.
    let info = read_public_info(&path).unwrap();
    assert_eq!(info.agent_id, agent_id("tampered"));
}

#[test]
fn resilience_tampered_format_marker_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("format.atk");

    let keypair = Ed25519KeyPair::generate();
    save_agent_key(&keypair, &agent_id("format"), &path, "test_pass").unwrap();

    {
        let mut file: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        file["format"] = serde_json::Value::String("atk-v9".to_string());
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();
    }

    let result = load_agent_key(&path, "test_pass");
    assert!(
        matches!(result, Err(TrustError::InvalidFileFormat(_))),
        "Unknown format marker should be rejected before decryption"
    );
}

#[test]
fn resilience_truncated_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("truncated.atk");

    let keypair = Ed25519KeyPair::generate();
    save_agent_key(&keypair, &agent_id("truncated"), &path, "test_pass").unwrap();

    // Truncate the file
    {
        let data = std::fs::read(&path).unwrap();
        let half = data.len() / 2;
        std::fs::write(&path, &data[..half]).unwrap();
    }

    let result = load_agent_key(&path, "test_pass");
    assert!(result.is_err(), "Truncated file should fail to load");
}

#[test]
fn resilience_empty_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("empty.atk");

    std::fs::write(&path, b"").unwrap();

    let result = load_agent_key(&path, "test_pass");
    assert!(result.is_err(), "Empty file should fail to load");
}

#[test]
fn resilience_nonexistent_file() {
    let result = load_agent_key(
        std::path::Path::new("/tmp/definitely_does_not_exist_12345.atk"),
        "test_pass",
    );
    assert!(result.is_err(), "Nonexistent file should fail");
}

#[test]
fn resilience_random_bytes_not_valid_atk() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("random.atk");

    let random_data: Vec<u8> = (0..1024).map(|i| (i * 17 + 31) as u8).collect();
    std::fs::write(&path, &random_data).unwrap();

    let result = load_agent_key(&path, "test_pass");
    assert!(
        result.is_err(),
        "Random bytes should not be a valid .atk file"
    );
}

#[test]
fn resilience_save_creates_parent_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let deep_path = tmp.path().join("a").join("b").join("c").join("deep.atk");

    let keypair = Ed25519KeyPair::generate();
    let result = save_agent_key(&keypair, &agent_id("deep"), &deep_path, "test_pass");
    assert!(result.is_ok(), "Should create parent directories");

    let loaded = load_agent_key(&deep_path, "test_pass").unwrap();
    assert_eq!(loaded.signing_key_bytes(), keypair.signing_key_bytes());
}

#[test]
fn resilience_key_roundtrip_25_times() {
    // Each save+load pair runs the Argon2id derivation twice, so the
    // iteration count stays modest.
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("roundtrip.atk");

    for i in 0..25 {
        let keypair = Ed25519KeyPair::generate();
        save_agent_key(&keypair, &agent_id("roundtrip"), &path, "pass").unwrap();
        let loaded = load_agent_key(&path, "pass").unwrap();
        assert_eq!(
            loaded.signing_key_bytes(),
            keypair.signing_key_bytes(),
            "Roundtrip {i} failed"
        );
        assert_eq!(loaded.verifying_key_bytes(), keypair.verifying_key_bytes());
    }
}

#[test]
fn resilience_corrupted_agent_record_poisons_only_itself() {
    let tmp = tempfile::tempdir().unwrap();
    let store = AgentStore::new(tmp.path()).unwrap();

    let mut ids = Vec::new();
    for name in ["alpha", "victim", "omega"] {
        let kp = Ed25519KeyPair::generate();
        let agent = AgentRecord::new(
            "aorg_resilience",
            name,
            vec!["invoice:read".to_string()],
            vec!["billing".to_string()],
            kp.verifying_key(),
        );
        store.save(&agent).unwrap();
        ids.push(agent.id);
    }

    let victim_path = tmp
        .path()
        .join("agents")
        .join(format!("{}.json", ids[1].0));
    std::fs::write(&victim_path, b"{ this is not json").unwrap();

    assert!(matches!(
        store.load(&ids[1]),
        Err(TrustError::InvalidFileFormat(_))
    ));
    assert!(store.load(&ids[0]).is_ok(), "Neighbors must still load");
    assert!(store.load(&ids[2]).is_ok(), "Neighbors must still load");

    // The damaged record is still visible to listing, so an operator can
    // find and repair it.
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.contains(&ids[1]));
}
