//! Error types for AgenticTrust.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key and credential token material is never included in
//! error messages.

/// Trust engine error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent is marked compromised: {0}")]
    AgentCompromised(String),

    #[error("Attestation expired: {id} (expired at {expired_at})")]
    AttestationExpired { id: String, expired_at: u64 },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Trust factor out of range: {factor} = {value} (must be in [0,1])")]
    FactorOutOfRange { factor: &'static str, value: f64 },

    #[error("Credential revoked or unknown: {0}")]
    CredentialRevoked(String),

    #[error("Credential expired: {0}")]
    CredentialExpired(String),

    #[error("Verification event already terminal: {0}")]
    EventTerminal(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrustError {
    /// Whether this error belongs to the "unauthorized" response class of the
    /// credential refresh contract, as opposed to the "bad request" class.
    ///
    /// Revoked, unknown, and expired credentials are unauthorized; malformed
    /// input is a bad request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::CredentialRevoked(_)
                | Self::CredentialExpired(_)
                | Self::SignatureInvalid
                | Self::AgentCompromised(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, TrustError>;
