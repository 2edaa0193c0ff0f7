//! Trust scoring — the weighted factor model and its audit history.
//!
//! A trust score is a pure function of eight behavioral factors, each in
//! [0,1] and each carrying a fixed weight. The weights sum to 1.0, so the
//! score is also in [0,1]. Scores are immutable: every recalculation
//! produces a new [`TrustScore`] and exactly one
//! [`TrustScoreHistoryEntry`] recording the change.

pub mod calculate;
pub mod factors;
pub mod history;

pub use calculate::{calculate_score, confidence_from_activity, TrustScore};
pub use factors::{TrustFactor, TrustScoreFactors};
pub use history::TrustScoreHistoryEntry;
