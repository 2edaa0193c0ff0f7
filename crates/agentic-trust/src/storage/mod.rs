//! Storage layer for agent records, attestations, events, and credentials.
//!
//! All stores are filesystem JSON, one file per record, version-wrapped.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.agentic-trust/`, with
//! sub-directories created by each store:
//!
//! ```text
//! ~/.agentic-trust/
//! ├── agents/
//! │   └── {agent_id}.json
//! ├── attestations/
//! │   └── {attestation_id}.json
//! ├── connections/
//! │   └── {connection_id}.json
//! ├── events/
//! │   └── {event_id}.json
//! ├── history/
//! │   └── {agent_id}/
//! │       └── {entry_id}.json
//! ├── alerts/
//! │   └── {alert_id}.json
//! ├── credentials/
//! │   ├── records/
//! │   │   └── {credential_id}.json
//! │   └── hashes/
//! │       └── {token_hash}.json
//! └── keys/
//!     └── {agent_id}.atk
//! ```
//!
//! # Modules
//!
//! - [`agent_store`] — CRUD for `AgentRecord`s.
//! - [`attestation_store`] — CRUD for attestations and connections.
//! - [`event_store`] — CRUD for `VerificationEvent`s.
//! - [`history_store`] — append-only trust score history.
//! - [`alert_store`] — CRUD for `Alert`s.
//! - [`credential_store`] — credentials with hash-keyed lookup.
//! - [`key_file`] — `.atk` file save/load with passphrase encryption.

pub mod agent_store;
pub mod alert_store;
pub mod attestation_store;
pub mod credential_store;
pub mod event_store;
pub mod history_store;
pub mod key_file;

// Re-export the primary types so callers can write `storage::AgentStore`
// without reaching into sub-modules.
pub use agent_store::AgentStore;
pub use alert_store::AlertStore;
pub use attestation_store::AttestationStore;
pub use credential_store::CredentialStore;
pub use event_store::EventStore;
pub use history_store::HistoryStore;
pub use key_file::{
    load_agent_key, read_public_info, save_agent_key, AgentKeyFile, EncryptionMetadata,
    KeyFileInfo,
};
