//! Verification events and their orchestration.
//!
//! A [`VerificationRequest`] describes one attempt to verify an agent; the
//! [`VerificationPipeline`] persists it, evaluates configuration drift,
//! moves it to a terminal status, and recalculates the agent's trust score.

pub mod pipeline;
pub mod record;

pub use pipeline::{PipelineOutcome, VerificationPipeline};
pub use record::{
    EventId, EventStatus, InitiatorType, Protocol, VerificationEvent, VerificationRequest,
    VerificationType,
};
