//! Submission reducer.
//!
//! Turns one raw submission plus the case resolution result into an outcome
//! event, the new pending flag for its type, and the timer action that keeps
//! timers consistent with the pending set.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate::SubmissionProcessed;
use crate::correlation::{case_correlation_key, CaseHandle};
use crate::interfaces::{
    FormValidation, FormValidator, LookupError, ReferenceData, ReferenceDataError, TimerKey,
    ValidationRequest, ValidatorError,
};
use crate::matching::{IdentityMatcher, PartyMatch};
use crate::model::{
    codes, DefendantCorrelation, PendingType, Problem, RawSubmission, SubmissionStatus,
    ValidationData,
};

/// What to do with the expiry timer for a submission or material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start(TimerKey),
    Cancel(TimerKey),
    /// Leave whatever timer exists alone.
    Keep,
}

/// Result of reducing one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub outcome: SubmissionProcessed,
    /// Whether the type stays in the pending set.
    pub pending: bool,
    pub timer: TimerAction,
}

#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),

    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error("No raw submission retained for pending type {0}")]
    MissingRawSubmission(PendingType),
}

/// Reduces submissions of every kind.
///
/// Stateless apart from its collaborators; all per-case state is passed in.
#[derive(Clone)]
pub struct SubmissionReducer {
    reference_data: Arc<dyn ReferenceData>,
    validator: Arc<dyn FormValidator>,
    matcher: IdentityMatcher,
    civil_override: Option<String>,
}

impl SubmissionReducer {
    pub fn new(reference_data: Arc<dyn ReferenceData>, validator: Arc<dyn FormValidator>) -> Self {
        Self {
            reference_data,
            validator,
            matcher: IdentityMatcher::new(),
            civil_override: None,
        }
    }

    /// Reference value that widens offence-code validity for civil cases.
    pub fn with_civil_override(mut self, civil_override: impl Into<String>) -> Self {
        self.civil_override = Some(civil_override.into());
        self
    }

    /// Reduce `raw` against the case resolution result.
    ///
    /// `prior_pending` is whether the submission's type was already pending
    /// on the case; it decides between starting a timer and keeping the
    /// running one.
    pub async fn reduce(
        &self,
        case: Option<&CaseHandle>,
        raw: &RawSubmission,
        prior_pending: bool,
    ) -> Result<Reduction, ReduceError> {
        let timer_key = submission_timer_key(raw);

        let reduction = match case {
            None if !raw.has_case_reference() => Reduction {
                outcome: self.outcome(
                    raw,
                    None,
                    SubmissionStatus::Rejected,
                    None,
                    raw.parties.iter().map(PartyMatch::unmatched).collect(),
                    vec![Problem::new(codes::CASE_URN_NOT_FOUND)
                        .with_value("urn", raw.case_reference.clone())],
                    vec![],
                ),
                pending: false,
                timer: if prior_pending {
                    TimerAction::Cancel(timer_key)
                } else {
                    TimerAction::Keep
                },
            },
            None => {
                let validation_data = ValidationData {
                    offence_codes: self
                        .reference_data
                        .valid_offence_codes(&raw.offence_codes, None)
                        .await?,
                    defendant_ids: Vec::new(),
                };
                let validation = self.validate(raw, None, validation_data).await?;
                self.pending(
                    raw,
                    None,
                    validation,
                    raw.parties.iter().map(PartyMatch::unmatched).collect(),
                    prior_pending,
                    timer_key,
                )
            }
            Some(case) => {
                let defendants: Vec<PartyMatch> = raw
                    .parties
                    .iter()
                    .map(|party| {
                        PartyMatch::new(
                            party,
                            self.matcher
                                .match_party(party, Some(case.case_id), &case.defendants),
                        )
                    })
                    .collect();
                let civil_override = case
                    .is_civil
                    .then_some(self.civil_override.as_deref())
                    .flatten();
                let validation_data = ValidationData {
                    offence_codes: self
                        .reference_data
                        .valid_offence_codes(&raw.offence_codes, civil_override)
                        .await?,
                    defendant_ids: correlation_pairs(&defendants),
                };
                let validation = self.validate(raw, Some(case), validation_data).await?;

                if validation.status == SubmissionStatus::Pending {
                    self.pending(
                        raw,
                        Some(case),
                        validation,
                        defendants,
                        prior_pending,
                        timer_key,
                    )
                } else {
                    Reduction {
                        outcome: self.outcome(
                            raw,
                            Some(case),
                            validation.status,
                            validation.normalized_form,
                            defendants,
                            validation.errors,
                            validation.warnings,
                        ),
                        pending: false,
                        timer: TimerAction::Cancel(timer_key),
                    }
                }
            }
        };

        info!(
            submission_id = %raw.submission_id,
            kind = %raw.kind,
            case_reference = %raw.case_reference,
            status = %reduction.outcome.status,
            "Reduced submission"
        );
        Ok(reduction)
    }

    /// Terminal FAILED outcome for a submission whose collaborators failed.
    pub fn failed(
        &self,
        raw: &RawSubmission,
        case: Option<&CaseHandle>,
        error: &ReduceError,
        prior_pending: bool,
    ) -> Reduction {
        let timer_key = submission_timer_key(raw);
        Reduction {
            outcome: self.outcome(
                raw,
                case,
                SubmissionStatus::Failed,
                None,
                raw.parties.iter().map(PartyMatch::unmatched).collect(),
                vec![Problem::new(codes::VALIDATION_UNAVAILABLE)
                    .with_value("reason", error.to_string())],
                vec![],
            ),
            pending: false,
            timer: if prior_pending {
                TimerAction::Cancel(timer_key)
            } else {
                TimerAction::Keep
            },
        }
    }

    /// Terminal REJECTED outcome for a retained pending submission replaced by
    /// `superseded_by`. Timers are left to the superseding submission.
    pub fn superseded(&self, previous: &RawSubmission, superseded_by: Uuid) -> SubmissionProcessed {
        self.outcome(
            previous,
            None,
            SubmissionStatus::Rejected,
            None,
            previous.parties.iter().map(PartyMatch::unmatched).collect(),
            vec![Problem::new(codes::SUBMISSION_SUPERSEDED)
                .with_value("supersededBy", superseded_by.to_string())],
            vec![],
        )
    }

    async fn validate(
        &self,
        raw: &RawSubmission,
        case: Option<&CaseHandle>,
        validation_data: ValidationData,
    ) -> Result<FormValidation, ValidatorError> {
        debug!(
            submission_id = %raw.submission_id,
            offence_codes = validation_data.offence_codes.len(),
            correlations = validation_data.defendant_ids.len(),
            "Rebuilding form"
        );
        self.validator
            .rebuild(ValidationRequest {
                kind: raw.kind,
                form: raw.form.clone(),
                validation_data,
                case_id: case.map(|c| c.case_id),
            })
            .await
    }

    /// PENDING outcome. Validator errors are dropped: they reflect the missing
    /// correlation, not the form.
    fn pending(
        &self,
        raw: &RawSubmission,
        case: Option<&CaseHandle>,
        validation: FormValidation,
        defendants: Vec<PartyMatch>,
        prior_pending: bool,
        timer_key: TimerKey,
    ) -> Reduction {
        let mut outcome = self.outcome(
            raw,
            case,
            SubmissionStatus::Pending,
            validation.normalized_form,
            defendants,
            vec![],
            validation.warnings,
        );
        outcome.raw_submission = Some(raw.clone());
        Reduction {
            outcome,
            pending: true,
            timer: if prior_pending {
                TimerAction::Keep
            } else {
                TimerAction::Start(timer_key)
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn outcome(
        &self,
        raw: &RawSubmission,
        case: Option<&CaseHandle>,
        status: SubmissionStatus,
        normalized_form: Option<serde_json::Value>,
        defendants: Vec<PartyMatch>,
        errors: Vec<Problem>,
        warnings: Vec<Problem>,
    ) -> SubmissionProcessed {
        SubmissionProcessed {
            submission_id: raw.submission_id,
            kind: raw.kind,
            case_reference: raw.case_reference.clone(),
            case_id: case.map(|c| c.case_id),
            status,
            normalized_form,
            defendants,
            errors,
            warnings,
            raw_submission: None,
            processed_at: Utc::now(),
        }
    }
}

/// Timer key for the pending slot `raw` occupies.
pub fn submission_timer_key(raw: &RawSubmission) -> TimerKey {
    TimerKey::Submission {
        correlation_key: case_correlation_key(&raw.case_reference),
        pending_type: raw.kind.pending_type(),
    }
}

/// External-to-internal defendant pairs for every identified party that
/// carries an external id. Ambiguous matches contribute their first
/// candidate.
fn correlation_pairs(defendants: &[PartyMatch]) -> Vec<DefendantCorrelation> {
    defendants
        .iter()
        .filter_map(|m| {
            let external = m.external_id.as_deref()?;
            let identity = m.outcome.identity()?;
            Some(DefendantCorrelation {
                external_defendant_id: external.to_string(),
                internal_defendant_id: identity.defendant_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests;
