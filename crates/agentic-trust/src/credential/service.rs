//! Credential issuance, refresh, and revocation.

use std::path::PathBuf;

use crate::agent::AgentId;
use crate::credential::record::{
    hash_token, Credential, CredentialId, RevocationReason, ACCESS_CREDENTIAL_VALIDITY_SECS,
    TOKEN_TYPE,
};
use crate::error::{Result, TrustError};
use crate::storage::CredentialStore;

/// A freshly issued credential plus its token value.
#[derive(Debug)]
pub struct IssuedCredential {
    pub credential: Credential,
    /// The opaque token. Returned exactly once; only its hash is stored.
    pub token: String,
}

/// Wire shape of a successful refresh.
#[derive(Debug, serde::Serialize)]
pub struct RefreshResponse {
    /// Short-lived access credential. Opaque to this crate and never
    /// persisted; resource servers validate it out of band.
    pub access_credential: String,
    /// The next refresh credential (the child's token value).
    pub refresh_credential: String,
    pub token_type: String,
    /// Advertised access-credential lifetime, in seconds.
    pub expires_in: u64,
}

/// What one refresh produced: the child record and the response to return
/// to the caller.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub credential: Credential,
    pub response: RefreshResponse,
}

/// Ancestry and descendants of one credential.
#[derive(Debug)]
pub struct CredentialLineage {
    /// Chain from the lineage root down to the requested credential,
    /// inclusive.
    pub ancestry: Vec<Credential>,
    /// Everything refreshed from the requested credential, directly or
    /// transitively, in no particular order.
    pub descendants: Vec<Credential>,
}

/// Rotating-credential service over a hash-keyed store.
///
/// Refresh forms a lineage: each presented credential can mint children
/// without losing its own validity, so several sessions derived from
/// different points of the lineage stay independently valid until they
/// individually expire or are revoked.
pub struct CredentialService {
    store: CredentialStore,
}

impl CredentialService {
    /// Open a service over the store rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the store directories cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: CredentialStore::new(base_dir)?,
        })
    }

    /// The underlying store, for read paths that outlive the service call.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Issue a root credential bound to a caller-declared device or
    /// session identity.
    ///
    /// # Errors
    ///
    /// Returns storage errors from persisting the record.
    pub fn issue(&self, agent_id: &AgentId, device_identity: &str) -> Result<IssuedCredential> {
        let token = mint_token();
        let now = crate::time::now_micros();
        let credential = Credential::root(
            agent_id.clone(),
            device_identity,
            hash_token(&token),
            now,
        );
        self.store.save(&credential)?;

        log::debug!("issued credential {} for {agent_id}", credential.id);

        Ok(IssuedCredential { credential, token })
    }

    /// Exchange a presented refresh credential for a new one.
    ///
    /// The presented credential stays valid: only usage statistics are
    /// recorded on it. Presenting it again before expiry mints another,
    /// independent child.
    ///
    /// # Errors
    ///
    /// - `TrustError::MalformedPayload` for an empty token.
    /// - `TrustError::CredentialRevoked` for a revoked record, and equally
    ///   for a hash that was never issued — callers cannot probe which
    ///   tokens exist.
    /// - `TrustError::CredentialExpired` past the natural expiry.
    pub fn refresh(&self, presented_token: &str) -> Result<RefreshOutcome> {
        if presented_token.is_empty() {
            return Err(TrustError::MalformedPayload(
                "refresh credential is empty".into(),
            ));
        }

        let presented_hash = hash_token(presented_token);
        let mut parent = match self.store.find_by_hash(&presented_hash)? {
            Some(credential) => credential,
            None => {
                return Err(TrustError::CredentialRevoked(
                    presented_hash[..12].to_string(),
                ))
            }
        };

        let now = crate::time::now_micros();
        if parent.revoked {
            return Err(TrustError::CredentialRevoked(parent.id.0.clone()));
        }
        if parent.is_expired(now) {
            return Err(TrustError::CredentialExpired(parent.id.0.clone()));
        }

        let child_token = mint_token();
        let child = Credential::child_of(&parent, hash_token(&child_token), now);
        self.store.save(&child)?;

        parent.record_use(now);
        if let Err(e) = self.store.save(&parent) {
            // Back out the child so a retry starts from a clean lineage.
            if let Err(undo) = self.store.delete(&child) {
                log::warn!(
                    "refresh rollback: could not remove credential {}: {undo}",
                    child.id
                );
            }
            return Err(e);
        }

        log::debug!(
            "refreshed credential {} into {} (rotation {})",
            parent.id,
            child.id,
            child.rotation_count
        );

        Ok(RefreshOutcome {
            response: RefreshResponse {
                access_credential: mint_token(),
                refresh_credential: child_token,
                token_type: TOKEN_TYPE.to_string(),
                expires_in: ACCESS_CREDENTIAL_VALIDITY_SECS,
            },
            credential: child,
        })
    }

    /// Revoke a credential, optionally with everything refreshed from it.
    ///
    /// Descendants revoked through `cascade` carry `RevocationReason::Cascade`
    /// regardless of `reason`. Already-revoked records keep their original
    /// revocation. Returns the ids in the revocation set.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` for an unknown id, or storage errors.
    pub fn revoke(
        &self,
        id: &CredentialId,
        reason: RevocationReason,
        cascade: bool,
    ) -> Result<Vec<CredentialId>> {
        let root = self.store.load(id)?;
        let now = crate::time::now_micros();

        let mut revoked_ids = Vec::new();
        let mut queue = vec![root];
        while let Some(mut current) = queue.pop() {
            let applied = if current.id == *id {
                reason
            } else {
                RevocationReason::Cascade
            };
            current.revoke(applied, now);
            self.store.save(&current)?;
            revoked_ids.push(current.id.clone());

            if cascade {
                queue.extend(self.store.children_of(&current.id)?);
            }
        }

        log::debug!("revoked {} credential(s) from {id}", revoked_ids.len());

        Ok(revoked_ids)
    }

    /// The lineage view of one credential: its chain of ancestors and all
    /// of its descendants.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NotFound` for an unknown id, or storage errors.
    pub fn lineage(&self, id: &CredentialId) -> Result<CredentialLineage> {
        let credential = self.store.load(id)?;

        // Walk up to the root, then flip to root-first order.
        let mut ancestry = vec![credential];
        while let Some(parent_id) = ancestry.last().and_then(|c| c.parent_id.clone()) {
            ancestry.push(self.store.load(&parent_id)?);
        }
        ancestry.reverse();

        let mut descendants = Vec::new();
        let mut queue = vec![id.clone()];
        while let Some(current) = queue.pop() {
            for child in self.store.children_of(&current)? {
                queue.push(child.id.clone());
                descendants.push(child);
            }
        }

        Ok(CredentialLineage {
            ancestry,
            descendants,
        })
    }
}

/// Mint an opaque token value: 32 random bytes, base64.
fn mint_token() -> String {
    base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        crate::crypto::random::random_token_32(),
    )
}
