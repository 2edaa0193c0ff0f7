//! The eight trust factors and their fixed weights.
//!
//! The factor table is enumerated rather than keyed by strings so the
//! weighting scheme cannot drift silently: adding, removing, or reweighting
//! a factor is a source change, and a unit test pins the weight sum to 1.0.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrustError};

/// One behavioral factor feeding the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustFactor {
    /// Identity verification status.
    Verification,
    /// Observed uptime.
    Uptime,
    /// Action success rate.
    SuccessRate,
    /// Security-alert posture (1.0 = no open alerts).
    AlertPosture,
    /// Compliance posture.
    Compliance,
    /// Account age.
    AccountAge,
    /// Drift-freedom (1.0 = no configuration drift observed).
    DriftFreedom,
    /// User feedback.
    UserFeedback,
}

impl TrustFactor {
    /// All factors, in weight order (heaviest first).
    pub const ALL: [TrustFactor; 8] = [
        TrustFactor::Verification,
        TrustFactor::Uptime,
        TrustFactor::SuccessRate,
        TrustFactor::AlertPosture,
        TrustFactor::Compliance,
        TrustFactor::AccountAge,
        TrustFactor::DriftFreedom,
        TrustFactor::UserFeedback,
    ];

    /// The fixed weight of this factor. Weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Verification => 0.25,
            Self::Uptime => 0.15,
            Self::SuccessRate => 0.15,
            Self::AlertPosture => 0.15,
            Self::Compliance => 0.10,
            Self::AccountAge => 0.10,
            Self::DriftFreedom => 0.05,
            Self::UserFeedback => 0.05,
        }
    }

    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Uptime => "uptime",
            Self::SuccessRate => "success_rate",
            Self::AlertPosture => "alert_posture",
            Self::Compliance => "compliance",
            Self::AccountAge => "account_age",
            Self::DriftFreedom => "drift_freedom",
            Self::UserFeedback => "user_feedback",
        }
    }
}

/// A complete factor vector. Every value must lie in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustScoreFactors {
    pub verification: f64,
    pub uptime: f64,
    pub success_rate: f64,
    pub alert_posture: f64,
    pub compliance: f64,
    pub account_age: f64,
    pub drift_freedom: f64,
    pub user_feedback: f64,
}

impl TrustScoreFactors {
    /// A neutral starting vector for a freshly registered agent: nothing
    /// proven yet except the absence of negatives.
    pub fn fresh_registration() -> Self {
        Self {
            verification: 0.628,
            uptime: 1.0,
            success_rate: 1.0,
            alert_posture: 1.0,
            compliance: 1.0,
            account_age: 1.0,
            drift_freedom: 1.0,
            user_feedback: 1.0,
        }
    }

    /// Return the value for a factor.
    pub fn value(&self, factor: TrustFactor) -> f64 {
        match factor {
            TrustFactor::Verification => self.verification,
            TrustFactor::Uptime => self.uptime,
            TrustFactor::SuccessRate => self.success_rate,
            TrustFactor::AlertPosture => self.alert_posture,
            TrustFactor::Compliance => self.compliance,
            TrustFactor::AccountAge => self.account_age,
            TrustFactor::DriftFreedom => self.drift_freedom,
            TrustFactor::UserFeedback => self.user_feedback,
        }
    }

    /// Validate that every factor lies in [0,1].
    ///
    /// Out-of-range input is an error, never silently clamped: a caller
    /// feeding a factor of 1.3 or NaN has a bug that clamping would hide.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::FactorOutOfRange` naming the first offending
    /// factor.
    pub fn validate(&self) -> Result<()> {
        for factor in TrustFactor::ALL {
            let value = self.value(factor);
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(TrustError::FactorOutOfRange {
                    factor: factor.as_str(),
                    value,
                });
            }
        }
        Ok(())
    }
}
