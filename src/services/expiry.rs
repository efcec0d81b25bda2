//! Expiry coordination: timer start/cancel requests and fired submission
//! timers.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::commands::EXPIRE_MATERIAL_COMMAND;
use crate::aggregate::{CaseState, SubmissionProcessed};
use crate::config::TimerConfig;
use crate::interfaces::{TimerError, TimerKey, TimerMetadata, TimerService};
use crate::matching::PartyMatch;
use crate::model::{codes, PendingType, Problem, SubmissionStatus};
use crate::reducer::TimerAction;

/// Runs timer actions against the timer engine and turns fired submission
/// timers into terminal outcomes.
#[derive(Clone)]
pub struct ExpiryCoordinator {
    timers: Arc<dyn TimerService>,
    config: TimerConfig,
}

impl ExpiryCoordinator {
    pub fn new(timers: Arc<dyn TimerService>, config: TimerConfig) -> Self {
        Self { timers, config }
    }

    /// What the engine delivers for `key`, and after how long.
    pub fn metadata(&self, correlation_key: Uuid, key: &TimerKey) -> TimerMetadata {
        match key {
            TimerKey::Submission { pending_type, .. } => TimerMetadata {
                expiry_command: pending_type.expiry_command().to_string(),
                correlation_key,
                fire_after: self.config.submission_expiry(),
            },
            TimerKey::Material { timer, .. } => TimerMetadata {
                expiry_command: EXPIRE_MATERIAL_COMMAND.to_string(),
                correlation_key,
                fire_after: self.config.material_expiry(*timer),
            },
        }
    }

    /// Run every action. Failures are logged and returned; the events that
    /// requested them are already persisted.
    pub async fn execute(
        &self,
        correlation_key: Uuid,
        actions: &[TimerAction],
    ) -> Vec<(TimerKey, TimerError)> {
        let mut failures = Vec::new();
        for action in actions {
            let result = match action {
                TimerAction::Start(key) => {
                    debug!(%correlation_key, timer = %key, "Starting timer");
                    self.timers
                        .start(*key, self.metadata(correlation_key, key))
                        .await
                        .map_err(|e| (*key, e))
                }
                TimerAction::Cancel(key) => {
                    debug!(%correlation_key, timer = %key, "Cancelling timer");
                    self.timers.cancel(*key).await.map_err(|e| (*key, e))
                }
                TimerAction::Keep => Ok(()),
            };
            if let Err((key, e)) = result {
                error!(
                    %correlation_key,
                    timer = %key,
                    error = %e,
                    "Timer request failed"
                );
                failures.push((key, e));
            }
        }
        failures
    }

    /// Terminal EXPIRED outcome for `pending_type`, or `None` when the type
    /// is no longer pending (or kept no submission to expire) and the fired
    /// timer must be ignored.
    pub fn expire_submission(
        state: &CaseState,
        pending_type: PendingType,
    ) -> Option<SubmissionProcessed> {
        if !state.is_pending(pending_type) {
            debug!(
                pending_type = %pending_type,
                "Timer fired for resolved type; ignoring"
            );
            return None;
        }

        let Some(raw) = state.raw_submission(pending_type) else {
            warn!(
                pending_type = %pending_type,
                case_reference = ?state.case_reference,
                "Pending type has no retained submission; ignoring expiry"
            );
            return None;
        };
        let problem = Problem::new(codes::SUBMISSION_EXPIRED)
            .with_value("pendingType", pending_type.to_string());

        let outcome = SubmissionProcessed {
            submission_id: raw.submission_id,
            kind: raw.kind,
            case_reference: raw.case_reference.clone(),
            case_id: state.case_id,
            status: SubmissionStatus::Expired,
            normalized_form: None,
            defendants: raw.parties.iter().map(PartyMatch::unmatched).collect(),
            errors: vec![problem],
            warnings: Vec::new(),
            raw_submission: None,
            processed_at: Utc::now(),
        };
        info!(
            submission_id = %outcome.submission_id,
            pending_type = %pending_type,
            case_reference = %outcome.case_reference,
            "Pending submission expired"
        );
        Some(outcome)
    }
}
