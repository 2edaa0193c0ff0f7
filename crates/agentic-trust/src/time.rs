//! Time utilities for AgenticTrust.
//!
//! All timestamps are Unix epoch microseconds (u64). Wire and display
//! formats use RFC 3339 UTC with a `Z` suffix.

use crate::error::{Result, TrustError};

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_micros() as u64
}

/// Convert microseconds to an RFC 3339 UTC string (`Z` suffix).
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp into microseconds since Unix epoch.
///
/// # Errors
///
/// Returns `TrustError::MalformedPayload` for unparseable or pre-epoch
/// timestamps.
pub fn rfc3339_to_micros(s: &str) -> Result<u64> {
    let dt = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| TrustError::MalformedPayload(format!("invalid timestamp {s:?}: {e}")))?;
    let micros = dt.timestamp_micros();
    if micros < 0 {
        return Err(TrustError::MalformedPayload(format!(
            "timestamp before Unix epoch: {s:?}"
        )));
    }
    Ok(micros as u64)
}
