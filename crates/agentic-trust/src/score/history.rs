//! Trust score audit history.
//!
//! Every score change appends exactly one entry. The entries form an
//! event-sourced log: the current score on the agent record is just the
//! latest projection and can be rebuilt from here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;
use crate::crypto::random::random_bytes;

/// One trust-score change, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustScoreHistoryEntry {
    /// Unique entry id (`ahist_` prefix).
    pub id: String,
    /// The agent whose score changed.
    pub agent_id: AgentId,
    /// The new score value.
    pub score: f64,
    /// The score before this change. `None` for the first entry.
    pub previous_score: Option<f64>,
    /// Why the score changed, e.g. `verification event aevt_...`.
    pub change_reason: String,
    /// Who triggered the change. `None` means an automated recalculation.
    pub changed_by: Option<String>,
    /// When the change was recorded (microseconds since Unix epoch).
    pub recorded_at: u64,
}

impl TrustScoreHistoryEntry {
    /// Create a new history entry with a fresh unique id.
    ///
    /// The id mixes in random bytes so that two entries for the same agent
    /// written in the same microsecond by racing recalculations still get
    /// distinct ids (and therefore distinct files).
    pub fn new(
        agent_id: AgentId,
        score: f64,
        previous_score: Option<f64>,
        change_reason: impl Into<String>,
        changed_by: Option<String>,
        recorded_at: u64,
    ) -> Self {
        let nonce: [u8; 16] = random_bytes();
        let material = format!(
            "history:{}:{}:{}:{}",
            agent_id,
            score,
            recorded_at,
            hex::encode(nonce)
        );
        let hash = Sha256::digest(material.as_bytes());
        let id = format!("ahist_{}", bs58::encode(&hash[..16]).into_string());

        Self {
            id,
            agent_id,
            score,
            previous_score,
            change_reason: change_reason.into(),
            changed_by,
            recorded_at,
        }
    }
}
