//! Verification event orchestration.
//!
//! One [`VerificationPipeline::run`] call takes an event through its whole
//! lifecycle: persist pending, evaluate drift, persist the terminal status,
//! recalculate the trust score, and append the audit history entry. The
//! sequence is all-or-nothing — a failure partway through removes what was
//! already written for this event, so callers retry the whole run instead
//! of resuming mid-sequence.

use std::path::PathBuf;

use crate::alert::Alert;
use crate::drift::detect_drift;
use crate::error::{Result, TrustError};
use crate::event::record::{EventStatus, VerificationEvent, VerificationRequest};
use crate::score::{
    calculate_score, confidence_from_activity, TrustScore, TrustScoreFactors,
    TrustScoreHistoryEntry,
};
use crate::storage::{AgentStore, AlertStore, EventStore, HistoryStore};

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub event: VerificationEvent,
    /// The drift alert, when the observed snapshot left the declared
    /// envelope.
    pub alert: Option<Alert>,
    /// The recalculated trust score, as persisted on the agent record.
    pub score: TrustScore,
    pub history_entry: TrustScoreHistoryEntry,
}

/// Orchestrates verification events over the filesystem stores.
pub struct VerificationPipeline {
    agents: AgentStore,
    events: EventStore,
    alerts: AlertStore,
    history: HistoryStore,
}

impl VerificationPipeline {
    /// Open a pipeline over the stores rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Io` if the store directories cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        Ok(Self {
            agents: AgentStore::new(&base_dir)?,
            events: EventStore::new(&base_dir)?,
            alerts: AlertStore::new(&base_dir)?,
            history: HistoryStore::new(&base_dir)?,
        })
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run one verification event to its terminal status.
    ///
    /// `outcome` is the result the verifier observed (success or failure).
    /// Drift never turns a success into a failure — it is recorded on the
    /// event, raises an alert, and zeroes the drift-freedom factor for this
    /// recalculation.
    ///
    /// # Errors
    ///
    /// - `TrustError::MalformedPayload` if `outcome` is not terminal.
    /// - `TrustError::FactorOutOfRange` for an invalid confidence or factor
    ///   vector.
    /// - `TrustError::UnknownAgent` if the agent is not registered.
    /// - Storage errors; in that case everything written for this event has
    ///   been removed again.
    pub fn run(
        &self,
        request: &VerificationRequest,
        outcome: EventStatus,
        factors: &TrustScoreFactors,
    ) -> Result<PipelineOutcome> {
        request.validate()?;
        factors.validate()?;
        if !outcome.is_terminal() {
            return Err(TrustError::MalformedPayload(
                "verification outcome must be success or failure".into(),
            ));
        }

        let mut agent = self.agents.load(&request.agent_id)?;
        let now = crate::time::now_micros();

        // 1. Persist the event as pending, with both snapshots.
        let mut event = VerificationEvent::pending(request, agent.declared_envelope(), now);
        self.events.save(&event)?;

        // 2. Drift evaluation; on drift the alert lands before the terminal
        //    status so no terminal drifted event exists without its alert.
        let report = detect_drift(&event.declared, &event.observed);
        let alert = if report.has_drift() {
            let alert = Alert::configuration_drift(
                request.organization_id.clone(),
                &agent.id,
                &report,
                now,
            );
            if let Err(e) = self.alerts.save(&alert) {
                self.discard(&event, None, None);
                return Err(e);
            }
            log::debug!(
                "configuration drift for {}: {} undeclared item(s)",
                agent.id,
                report.drifted_items().len()
            );
            Some(alert)
        } else {
            None
        };

        // 3. Terminal status.
        event.apply_drift(&report);
        if let Err(e) = event.complete(outcome, now) {
            self.discard(&event, alert.as_ref(), None);
            return Err(e);
        }
        if let Err(e) = self.events.save(&event) {
            self.discard(&event, alert.as_ref(), None);
            return Err(e);
        }

        // 4. Score recalculation. Drift feeds the drift-freedom factor
        //    instead of overwriting the score directly.
        let mut effective = *factors;
        if report.has_drift() {
            effective.drift_freedom = 0.0;
        }
        let value = match calculate_score(&effective) {
            Ok(value) => value,
            Err(e) => {
                self.discard(&event, alert.as_ref(), None);
                return Err(e);
            }
        };
        let count = match self.history.count_for_agent(&agent.id) {
            Ok(count) => count,
            Err(e) => {
                self.discard(&event, alert.as_ref(), None);
                return Err(e);
            }
        };
        let score = TrustScore::new(value, confidence_from_activity(count + 1, Some(now), now), now);

        let entry = TrustScoreHistoryEntry::new(
            agent.id.clone(),
            value,
            agent.trust_score.map(|s| s.value),
            format!("verification event {}", event.id),
            None,
            now,
        );
        if let Err(e) = self.history.append(&entry) {
            self.discard(&event, alert.as_ref(), None);
            return Err(e);
        }

        agent.trust_score = Some(score);
        agent.updated_at = now;
        if let Err(e) = self.agents.save(&agent) {
            self.discard(&event, alert.as_ref(), Some(&entry));
            return Err(e);
        }

        log::debug!(
            "verification event {} completed as {} for {} (score {:.3}, drift {})",
            event.id,
            outcome.as_str(),
            agent.id,
            value,
            report.has_drift()
        );

        Ok(PipelineOutcome {
            event,
            alert,
            score,
            history_entry: entry,
        })
    }

    /// Best-effort removal of everything this run wrote, newest first.
    fn discard(
        &self,
        event: &VerificationEvent,
        alert: Option<&Alert>,
        entry: Option<&TrustScoreHistoryEntry>,
    ) {
        if let Some(entry) = entry {
            if let Err(e) = self.history.delete(&entry.agent_id, &entry.id) {
                log::warn!(
                    "pipeline rollback: could not remove history entry {}: {e}",
                    entry.id
                );
            }
        }
        if let Some(alert) = alert {
            if let Err(e) = self.alerts.delete(&alert.id) {
                log::warn!("pipeline rollback: could not remove alert {}: {e}", alert.id);
            }
        }
        if let Err(e) = self.events.delete(&event.id) {
            log::warn!("pipeline rollback: could not remove event {}: {e}", event.id);
        }
    }
}
