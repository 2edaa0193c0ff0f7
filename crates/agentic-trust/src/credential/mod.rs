//! Rotating credentials with refresh lineage.
//!
//! A root credential is issued against a device or session identity; each
//! refresh mints a child credential without invalidating its parent. Records
//! store only token hashes. [`CredentialService`] is the entry point;
//! [`record`] holds the persistent shapes.

pub mod record;
pub mod service;

pub use record::{
    hash_token, Credential, CredentialId, RevocationReason,
    ACCESS_CREDENTIAL_VALIDITY_SECS, REFRESH_CREDENTIAL_VALIDITY_MICROS, TOKEN_TYPE,
};
pub use service::{
    CredentialLineage, CredentialService, IssuedCredential, RefreshOutcome, RefreshResponse,
};
