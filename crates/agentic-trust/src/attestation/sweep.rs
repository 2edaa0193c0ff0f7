//! Attestation expiry sweep.
//!
//! Runs periodically and independently of ingestion. The sweep snapshots
//! the id list and the pass-start instant once, then invalidates only
//! attestations whose expiry is at or before pass start. An attestation
//! ingested mid-sweep always carries a later expiry than pass start, so a
//! single pass can never sweep it with stale data.

use crate::error::{Result, TrustError};
use crate::storage::AttestationStore;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    /// Attestations in the snapshot taken at pass start.
    pub scanned: usize,
    /// Attestations moved from valid to invalid in this pass.
    pub invalidated: usize,
    /// The pass-start instant every expiry was compared against.
    pub pass_started_at: u64,
}

/// Run one expiry pass over all stored attestations.
///
/// Invalidation is monotonic: records already invalid are counted as
/// scanned but never touched. Records deleted between snapshot and load
/// are skipped.
///
/// # Errors
///
/// Returns storage errors other than a record vanishing mid-pass.
pub fn sweep_expired(store: &AttestationStore) -> Result<SweepReport> {
    let pass_started_at = crate::time::now_micros();
    let ids = store.list_attestations()?;
    let scanned = ids.len();
    let mut invalidated = 0usize;

    for id in ids {
        let mut attestation = match store.load_attestation(&id) {
            Ok(a) => a,
            Err(TrustError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };

        if attestation.is_valid && attestation.is_expired(pass_started_at) {
            attestation.invalidate(pass_started_at);
            store.save_attestation(&attestation)?;
            invalidated += 1;
        }
    }

    if invalidated > 0 {
        log::debug!("expiry sweep invalidated {invalidated} of {scanned} attestations");
    }

    Ok(SweepReport {
        scanned,
        invalidated,
        pass_started_at,
    })
}
