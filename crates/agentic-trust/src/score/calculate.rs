//! Trust score calculation.
//!
//! `calculate_score` is deliberately a pure function: identical factor
//! vectors always produce identical scores, which makes every recorded
//! score reproducible from its history entry.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::score::factors::{TrustFactor, TrustScoreFactors};

/// Activity count at which the confidence frequency term saturates.
const CONFIDENCE_SATURATION_COUNT: f64 = 20.0;

/// Half-life in days of the confidence recency term.
const CONFIDENCE_HALF_LIFE_DAYS: f64 = 30.0;

/// A computed trust score. Immutable once created: recalculation produces
/// a new value plus a history entry, never an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    /// The weighted factor sum, in [0,1].
    pub value: f64,
    /// Confidence in the score, in [0,1], driven by how much recent
    /// verification activity backs it.
    pub confidence: f64,
    /// When this score was calculated (microseconds since Unix epoch).
    pub calculated_at: u64,
}

impl TrustScore {
    pub fn new(value: f64, confidence: f64, calculated_at: u64) -> Self {
        Self {
            value,
            confidence,
            calculated_at,
        }
    }
}

/// Compute the weighted trust score for a validated factor vector.
///
/// # Errors
///
/// Returns `TrustError::FactorOutOfRange` if any factor lies outside [0,1].
pub fn calculate_score(factors: &TrustScoreFactors) -> Result<f64> {
    factors.validate()?;

    let score = TrustFactor::ALL
        .iter()
        .map(|f| factors.value(*f) * f.weight())
        .sum();

    Ok(score)
}

/// Confidence in a score from the count and recency of the verification
/// activity behind it.
///
/// `count` is the number of recalculations (including the current one),
/// `newest_at` the instant of the most recent one. An agent with no
/// activity gets the neutral 0.5. Otherwise frequency contributes up to
/// 0.5 (saturating at 20 events) and recency up to 0.5, decaying with a
/// 30-day half-life.
pub fn confidence_from_activity(count: u64, newest_at: Option<u64>, now: u64) -> f64 {
    let Some(newest) = newest_at else {
        return 0.5;
    };
    if count == 0 {
        return 0.5;
    }

    let frequency = (count as f64 / CONFIDENCE_SATURATION_COUNT).min(1.0) * 0.5;

    let age_days = now.saturating_sub(newest) as f64 / 86_400_000_000.0;
    let recency = (-0.693 * age_days / CONFIDENCE_HALF_LIFE_DAYS).exp() * 0.5;

    (frequency + recency).min(1.0)
}
