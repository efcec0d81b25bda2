use super::*;
use uuid::Uuid;

use crate::clients::mock::{ScriptedFormValidator, StaticReferenceData};
use crate::matching::MatchOutcome;
use crate::model::{CaseDefendant, ExternalParty, PersonDetails, SubmissionKind};

const CASE_ID: Uuid = Uuid::from_u128(42);
const DEFENDANT_ID: Uuid = Uuid::from_u128(7);

struct Fixture {
    validator: Arc<ScriptedFormValidator>,
    reducer: SubmissionReducer,
}

fn fixture() -> Fixture {
    let validator = Arc::new(ScriptedFormValidator::new());
    let reference_data = Arc::new(
        StaticReferenceData::new(["TH68001"]).with_civil_codes("CIVIL-OVERRIDE", ["CV001"]),
    );
    let reducer = SubmissionReducer::new(reference_data, validator.clone())
        .with_civil_override("CIVIL-OVERRIDE");
    Fixture { validator, reducer }
}

fn raw(kind: SubmissionKind, case_reference: &str) -> RawSubmission {
    RawSubmission {
        submission_id: Uuid::from_u128(1),
        kind,
        case_reference: case_reference.to_string(),
        form: serde_json::json!({"field": "value"}),
        parties: vec![ExternalParty {
            external_id: Some("EXT-1".to_string()),
            cps_defendant_id: Some("C-1".to_string()),
            ..Default::default()
        }],
        offence_codes: vec!["TH68001".to_string(), "CV001".to_string()],
        received_at: Utc::now(),
    }
}

fn case(is_civil: bool) -> CaseHandle {
    CaseHandle {
        case_id: CASE_ID,
        is_civil,
        defendants: vec![CaseDefendant::individual(
            DEFENDANT_ID,
            PersonDetails {
                first_name: Some("Ann".to_string()),
                middle_name: None,
                last_name: Some("Smith".to_string()),
                date_of_birth: None,
                arrest_summons_number: None,
            },
        )
        .with_cps_defendant_id("C-1")],
    }
}

#[tokio::test]
async fn test_unresolved_case_forces_pending_and_starts_timer() {
    let f = fixture();
    f.validator
        .set_verdict(
            SubmissionKind::Pet,
            SubmissionStatus::Rejected,
            vec![Problem::new("DEFENDANT_REQUIRED")],
        )
        .await;
    let submission = raw(SubmissionKind::Pet, "TFL4359536");

    let reduction = f.reducer.reduce(None, &submission, false).await.unwrap();

    assert!(reduction.pending);
    assert_eq!(reduction.outcome.status, SubmissionStatus::Pending);
    assert_eq!(reduction.outcome.case_id, None);
    assert!(reduction.outcome.errors.is_empty());
    assert_eq!(reduction.outcome.raw_submission.as_ref(), Some(&submission));
    assert_eq!(
        reduction.timer,
        TimerAction::Start(TimerKey::Submission {
            correlation_key: case_correlation_key("TFL4359536"),
            pending_type: PendingType::Pet,
        })
    );

    let requests = f.validator.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].validation_data.defendant_ids.is_empty());
    assert_eq!(requests[0].case_id, None);
}

#[tokio::test]
async fn test_unresolved_case_already_pending_keeps_timer() {
    let f = fixture();
    let reduction = f
        .reducer
        .reduce(None, &raw(SubmissionKind::Bcm, "TFL4359536"), true)
        .await
        .unwrap();
    assert!(reduction.pending);
    assert_eq!(reduction.timer, TimerAction::Keep);
}

#[tokio::test]
async fn test_unresolved_parties_are_flagged_unmatched() {
    let f = fixture();
    let reduction = f
        .reducer
        .reduce(None, &raw(SubmissionKind::Pet, "TFL4359536"), false)
        .await
        .unwrap();
    assert_eq!(reduction.outcome.defendants.len(), 1);
    assert_eq!(reduction.outcome.defendants[0].outcome, MatchOutcome::Unmatched);
}

#[tokio::test]
async fn test_blank_reference_is_rejected_with_case_urn_not_found() {
    let f = fixture();
    let reduction = f
        .reducer
        .reduce(None, &raw(SubmissionKind::Pet, "  "), false)
        .await
        .unwrap();

    assert!(!reduction.pending);
    assert_eq!(reduction.outcome.status, SubmissionStatus::Rejected);
    assert_eq!(reduction.outcome.errors[0].code, codes::CASE_URN_NOT_FOUND);
    assert_eq!(reduction.outcome.errors[0].value("urn"), Some("  "));
    assert_eq!(reduction.timer, TimerAction::Keep);
    assert!(f.validator.requests().await.is_empty());
}

#[tokio::test]
async fn test_resolved_case_adopts_validator_status_and_cancels() {
    let f = fixture();
    f.validator
        .set_verdict(
            SubmissionKind::Ptph,
            SubmissionStatus::SuccessWithWarnings,
            vec![Problem::new("LATE_SUBMISSION")],
        )
        .await;
    let submission = raw(SubmissionKind::Ptph, "TFL4359536");

    let reduction = f
        .reducer
        .reduce(Some(&case(false)), &submission, true)
        .await
        .unwrap();

    assert!(!reduction.pending);
    assert_eq!(reduction.outcome.status, SubmissionStatus::SuccessWithWarnings);
    assert_eq!(reduction.outcome.case_id, Some(CASE_ID));
    assert_eq!(reduction.outcome.warnings[0].code, "LATE_SUBMISSION");
    assert!(reduction.outcome.raw_submission.is_none());
    assert!(matches!(reduction.timer, TimerAction::Cancel(_)));
}

#[tokio::test]
async fn test_resolved_case_builds_correlation_table() {
    let f = fixture();
    let reduction = f
        .reducer
        .reduce(Some(&case(false)), &raw(SubmissionKind::Pet, "TFL4359536"), false)
        .await
        .unwrap();

    let identity = reduction.outcome.defendants[0].outcome.identity().unwrap();
    assert_eq!(identity.defendant_id, DEFENDANT_ID);

    let requests = f.validator.requests().await;
    let data = &requests[0].validation_data;
    assert_eq!(data.internal_id_for("EXT-1"), Some(DEFENDANT_ID));
    assert!(data.is_offence_code_valid("TH68001"));
    assert!(!data.is_offence_code_valid("CV001"));
    assert_eq!(requests[0].case_id, Some(CASE_ID));
}

#[tokio::test]
async fn test_civil_case_uses_override_for_offence_codes() {
    let f = fixture();
    f.reducer
        .reduce(Some(&case(true)), &raw(SubmissionKind::Pet, "TFL4359536"), false)
        .await
        .unwrap();

    let requests = f.validator.requests().await;
    assert!(requests[0].validation_data.is_offence_code_valid("CV001"));
}

#[tokio::test]
async fn test_resolved_case_still_pending_is_tolerated() {
    let f = fixture();
    f.validator
        .set_verdict(SubmissionKind::Cotr, SubmissionStatus::Pending, vec![])
        .await;
    let reduction = f
        .reducer
        .reduce(Some(&case(false)), &raw(SubmissionKind::Cotr, "TFL4359536"), true)
        .await
        .unwrap();
    assert!(reduction.pending);
    assert_eq!(reduction.timer, TimerAction::Keep);
    assert!(reduction.outcome.raw_submission.is_some());
}

#[tokio::test]
async fn test_validator_failure_propagates() {
    let f = fixture();
    f.validator.set_fail(SubmissionKind::Bcm, true).await;
    let err = f
        .reducer
        .reduce(Some(&case(false)), &raw(SubmissionKind::Bcm, "TFL4359536"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ReduceError::Validator(_)));
}

#[tokio::test]
async fn test_failed_outcome_carries_reason() {
    let f = fixture();
    let submission = raw(SubmissionKind::Pet, "TFL4359536");
    let error = ReduceError::Validator(ValidatorError::Unavailable("down".to_string()));

    let reduction = f.reducer.failed(&submission, None, &error, true);

    assert_eq!(reduction.outcome.status, SubmissionStatus::Failed);
    assert_eq!(reduction.outcome.errors[0].code, codes::VALIDATION_UNAVAILABLE);
    assert!(reduction.outcome.errors[0]
        .value("reason")
        .is_some_and(|r| r.contains("down")));
    assert!(matches!(reduction.timer, TimerAction::Cancel(_)));
}

#[tokio::test]
async fn test_reduce_is_repeatable() {
    let f = fixture();
    let submission = raw(SubmissionKind::Pet, "TFL4359536");
    let first = f.reducer.reduce(None, &submission, false).await.unwrap();
    let second = f.reducer.reduce(None, &submission, true).await.unwrap();

    assert_eq!(first.outcome.status, second.outcome.status);
    assert_eq!(first.outcome.normalized_form, second.outcome.normalized_form);
    assert!(matches!(first.timer, TimerAction::Start(_)));
    assert_eq!(second.timer, TimerAction::Keep);
}
