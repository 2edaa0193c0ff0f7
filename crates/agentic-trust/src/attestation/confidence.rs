//! Connection confidence scoring.
//!
//! A server's confidence score reflects how much live, recent attestation
//! evidence backs the connection: half from attestation frequency, half from
//! the age of the newest valid attestation.

/// Valid-attestation count at which the frequency term saturates.
const CONFIDENCE_SATURATION_COUNT: f64 = 20.0;

/// Half-life in days of the recency term.
const CONFIDENCE_HALF_LIFE_DAYS: f64 = 30.0;

/// Compute a 0-100 confidence score for a connection.
///
/// `valid_count` counts only attestations that are currently valid (not
/// expired, not invalidated); `newest_valid_at` is the verification instant
/// of the newest of them. A connection with no valid attestation has no
/// live evidence and scores 0.
pub fn connection_confidence(valid_count: u64, newest_valid_at: Option<u64>, now: u64) -> u8 {
    let newest = match newest_valid_at {
        Some(at) if valid_count > 0 => at,
        _ => return 0,
    };

    let frequency = (valid_count as f64 / CONFIDENCE_SATURATION_COUNT).min(1.0);

    let age_days = now.saturating_sub(newest) as f64 / 86_400_000_000.0;
    let recency = (-0.693 * age_days / CONFIDENCE_HALF_LIFE_DAYS).exp();

    (100.0 * (0.5 * frequency + 0.5 * recency)).round() as u8
}
