//! Case command handler.
//!
//! Each command runs load → decide → persist against the case correlation
//! stream it addresses, retried with backoff when another writer wins the
//! append. Timer requests and projectors run only after a successful
//! persist.

use std::sync::Arc;

use backon::Retryable;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::commands::{CaseCommand, DefendantsRecorded};
use super::expiry::ExpiryCoordinator;
use super::material::MaterialExpiryTracker;
use super::Decision;
use crate::aggregate::{replay_all, CaseEvent, CaseState, DefendantsAdded};
use crate::config::{Config, RetryConfig};
use crate::correlation::CaseCorrelator;
use crate::interfaces::{
    CaseLookup, EventStore, FormValidator, Projector, ReferenceData, TimerKey, TimerService,
};
use crate::model::{PendingType, RawSubmission};
use crate::reducer::{ReduceError, SubmissionReducer, TimerAction};
use crate::repository::{AggregateRepository, Loaded, RepositoryError};

/// Errors that escape command handling.
///
/// Collaborator failures never do: they become FAILED outcomes or leave the
/// pending state untouched.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl HandlerError {
    pub fn is_conflict(&self) -> bool {
        match self {
            HandlerError::Repository(e) => e.is_conflict(),
        }
    }
}

/// What a command persisted.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub correlation_key: Uuid,
    pub events: Vec<CaseEvent>,
    pub timers: Vec<TimerAction>,
    /// Stream version after the command.
    pub version: u64,
}

impl CommandOutcome {
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

pub struct CaseCommandHandler {
    repository: AggregateRepository<CaseState>,
    correlator: CaseCorrelator,
    reducer: SubmissionReducer,
    expiry: ExpiryCoordinator,
    materials: MaterialExpiryTracker,
    projectors: Vec<Arc<dyn Projector>>,
    retry: RetryConfig,
}

impl CaseCommandHandler {
    pub fn new(
        event_store: Arc<dyn EventStore>,
        case_lookup: Arc<dyn CaseLookup>,
        reference_data: Arc<dyn ReferenceData>,
        validator: Arc<dyn FormValidator>,
        timers: Arc<dyn TimerService>,
        config: &Config,
    ) -> Self {
        let mut reducer = SubmissionReducer::new(reference_data, validator);
        if let Some(civil_override) = &config.reference_data.civil_offence_override {
            reducer = reducer.with_civil_override(civil_override.clone());
        }
        Self {
            repository: AggregateRepository::new(event_store),
            correlator: CaseCorrelator::new(case_lookup),
            reducer,
            expiry: ExpiryCoordinator::new(timers, config.timers.clone()),
            materials: MaterialExpiryTracker::new(),
            projectors: Vec::new(),
            retry: config.retry.clone(),
        }
    }

    /// Feed every persisted batch to `projector`.
    pub fn with_projector(mut self, projector: Arc<dyn Projector>) -> Self {
        self.projectors.push(projector);
        self
    }

    /// Current state of the stream rooted at `correlation_key`.
    pub async fn load(&self, correlation_key: Uuid) -> Result<Loaded<CaseState>, HandlerError> {
        Ok(self.repository.load(correlation_key).await?)
    }

    pub async fn handle(&self, command: CaseCommand) -> Result<CommandOutcome, HandlerError> {
        let root = command.stream_root();
        let name = command.name();

        let outcome = (|| async { self.handle_once(root, &command).await })
            .retry(self.retry.backoff())
            .when(HandlerError::is_conflict)
            .notify(|err, delay| {
                debug!(command = name, %root, error = %err, ?delay, "Sequence conflict; retrying");
            })
            .await?;

        if outcome.is_noop() {
            debug!(command = name, %root, "Command produced no events");
        } else {
            info!(
                command = name,
                %root,
                events = outcome.events.len(),
                version = outcome.version,
                "Command persisted"
            );
        }

        self.post_persist(&outcome).await;
        Ok(outcome)
    }

    async fn handle_once(
        &self,
        root: Uuid,
        command: &CaseCommand,
    ) -> Result<CommandOutcome, HandlerError> {
        let loaded = self.repository.load(root).await?;
        let decision = self.decide(root, &loaded.state, command).await;
        let version = self
            .repository
            .persist(root, loaded.version, &decision.events)
            .await?;
        Ok(CommandOutcome {
            correlation_key: root,
            events: decision.events,
            timers: decision.timers,
            version,
        })
    }

    async fn decide(&self, root: Uuid, state: &CaseState, command: &CaseCommand) -> Decision {
        if let Some((kind, form)) = command.as_received() {
            return self.process_received(state, form.clone().into_raw(kind)).await;
        }
        if let Some(pending_type) = command.as_timer_expired() {
            return self.expire_submission(root, state, pending_type);
        }
        match command {
            CaseCommand::RecordDefendantsAdded(recorded) => {
                self.record_defendants_added(state, recorded).await
            }
            CaseCommand::AddPendingMaterial(material) => self.materials.on_pending(state, material),
            CaseCommand::AcceptMaterial(material) => {
                self.materials.on_settled(state, material, true)
            }
            CaseCommand::RejectMaterial(material) => {
                self.materials.on_settled(state, material, false)
            }
            CaseCommand::EjectCase(ejected) => self.materials.on_ejected(state, ejected.case_id),
            CaseCommand::ExpireMaterial(fired) => self.materials.on_timer_fired(state, fired),
            _ => Decision::default(),
        }
    }

    async fn process_received(&self, state: &CaseState, raw: RawSubmission) -> Decision {
        if let Some(status) = state.settled_status(raw.submission_id) {
            debug!(
                submission_id = %raw.submission_id,
                status = %status,
                "Submission already settled; ignoring redelivery"
            );
            return Decision::default();
        }

        let pending_type = raw.kind.pending_type();
        let decision = self.reduce_received(state, &raw).await;

        match state
            .raw_submission(pending_type)
            .filter(|previous| previous.submission_id != raw.submission_id)
        {
            Some(previous) => {
                info!(
                    submission_id = %previous.submission_id,
                    superseded_by = %raw.submission_id,
                    pending_type = %pending_type,
                    "Pending submission superseded"
                );
                let superseded =
                    CaseEvent::SubmissionProcessed(self.reducer.superseded(previous, raw.submission_id));
                Decision {
                    events: std::iter::once(superseded).chain(decision.events).collect(),
                    timers: decision.timers,
                }
            }
            None => decision,
        }
    }

    async fn reduce_received(&self, state: &CaseState, raw: &RawSubmission) -> Decision {
        let prior_pending = state.is_pending(raw.kind.pending_type());
        let case = match self.correlator.resolve(&raw.case_reference).await {
            Ok(case) => case,
            Err(e) => {
                let error = ReduceError::from(e);
                warn!(
                    submission_id = %raw.submission_id,
                    case_reference = %raw.case_reference,
                    error = %error,
                    "Case lookup failed; recording FAILED outcome"
                );
                return self.reducer.failed(raw, None, &error, prior_pending).into();
            }
        };

        match self.reducer.reduce(case.as_ref(), raw, prior_pending).await {
            Ok(reduction) => reduction.into(),
            Err(error) => {
                warn!(
                    submission_id = %raw.submission_id,
                    case_reference = %raw.case_reference,
                    error = %error,
                    "Submission reduction failed; recording FAILED outcome"
                );
                self.reducer
                    .failed(raw, case.as_ref(), &error, prior_pending)
                    .into()
            }
        }
    }

    fn expire_submission(&self, root: Uuid, state: &CaseState, pending_type: PendingType) -> Decision {
        match ExpiryCoordinator::expire_submission(state, pending_type) {
            Some(outcome) => Decision::default()
                .with_event(CaseEvent::SubmissionProcessed(outcome))
                .with_timer(TimerAction::Cancel(TimerKey::Submission {
                    correlation_key: root,
                    pending_type,
                })),
            None => Decision::default(),
        }
    }

    async fn record_defendants_added(
        &self,
        state: &CaseState,
        recorded: &DefendantsRecorded,
    ) -> Decision {
        let mut new_ids: Vec<Uuid> = recorded
            .defendant_ids
            .iter()
            .filter(|id| !state.defendant_ids.contains(id))
            .copied()
            .collect();
        new_ids.sort();
        new_ids.dedup();

        let already_recorded = new_ids.is_empty() && state.case_id == Some(recorded.case_id);
        if already_recorded && state.pending.is_empty() {
            debug!(
                case_reference = %recorded.case_reference,
                "No new defendants; nothing to replay"
            );
            return Decision::default();
        }

        // A redelivery still replays types left pending by an earlier failed
        // replay.
        let mut decision = Decision::default();
        if !already_recorded {
            decision = decision.with_event(CaseEvent::DefendantsAdded(DefendantsAdded {
                case_id: recorded.case_id,
                defendant_ids: new_ids,
                added_at: chrono::Utc::now(),
            }));
        }

        if state.pending.is_empty() {
            return decision;
        }

        let case = match self.correlator.resolve(&recorded.case_reference).await {
            Ok(Some(case)) => case,
            Ok(None) => {
                warn!(
                    case_reference = %recorded.case_reference,
                    "Defendants added but case lookup does not know the case yet; pending types stay pending"
                );
                return decision;
            }
            Err(e) => {
                warn!(
                    case_reference = %recorded.case_reference,
                    error = %e,
                    "Case lookup failed during replay; pending types stay pending"
                );
                return decision;
            }
        };

        let reducer = &self.reducer;
        let case_ref = &case;
        let report = replay_all(&state.pending, |pending_type| {
            let raw = state.raw_submission(pending_type).cloned();
            async move {
                let raw = raw.ok_or(ReduceError::MissingRawSubmission(pending_type))?;
                reducer.reduce(Some(case_ref), &raw, true).await
            }
        })
        .await;

        info!(
            case_reference = %recorded.case_reference,
            resolved = ?report.resolved(),
            remaining = report.remaining.len(),
            failures = report.failures.len(),
            "Replayed pending submissions"
        );
        for reduction in report.reductions {
            decision.push_reduction(reduction);
        }
        decision
    }

    async fn post_persist(&self, outcome: &CommandOutcome) {
        self.expiry
            .execute(outcome.correlation_key, &outcome.timers)
            .await;

        if outcome.events.is_empty() {
            return;
        }
        for projector in &self.projectors {
            if let Err(e) = projector
                .project(outcome.correlation_key, &outcome.events)
                .await
            {
                error!(
                    projector = projector.name(),
                    correlation_key = %outcome.correlation_key,
                    error = %e,
                    "Projector failed"
                );
            }
        }
    }
}
