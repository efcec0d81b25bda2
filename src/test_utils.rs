//! Test utilities: fixtures and a fully wired handler over in-memory
//! collaborators.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::clients::mock::{
    InMemoryCaseLookup, RecordingTimerService, ScriptedFormValidator, StaticReferenceData,
};
use crate::config::Config;
use crate::correlation::case_correlation_key;
use crate::interfaces::{CaseRecord, TimerKey};
use crate::model::{CaseDefendant, ExternalParty, PendingType, PersonDetails, SubmissionKind};
use crate::projectors::SubmissionStatusProjector;
use crate::services::{
    CaseCommand, CaseCommandHandler, CaseEjected, DefendantsRecorded, MaterialRef, ReceivedForm,
};
use crate::storage::InMemoryEventStore;
use crate::utils::bootstrap::try_init_tracing;

/// Offence code every harness reference data knows.
pub const KNOWN_OFFENCE_CODE: &str = "TH68001";
/// Offence code valid only under the civil override.
pub const CIVIL_OFFENCE_CODE: &str = "CV00001";

/// A form for `case_reference` naming one party by CPS defendant id.
pub fn received_form(submission_id: Uuid, case_reference: &str, cps_defendant_id: &str) -> ReceivedForm {
    ReceivedForm {
        submission_id,
        case_reference: case_reference.to_string(),
        form: serde_json::json!({
            "submissionId": submission_id.to_string(),
            "defendants": [{"cpsDefendantId": cps_defendant_id}],
        }),
        parties: vec![ExternalParty {
            external_id: Some(format!("EXT-{cps_defendant_id}")),
            cps_defendant_id: Some(cps_defendant_id.to_string()),
            ..Default::default()
        }],
        offence_codes: vec![KNOWN_OFFENCE_CODE.to_string()],
        received_at: Utc::now(),
    }
}

/// An individual defendant carrying `cps_defendant_id`.
pub fn defendant(id: Uuid, cps_defendant_id: &str) -> CaseDefendant {
    CaseDefendant::individual(
        id,
        PersonDetails {
            first_name: Some("Ann".to_string()),
            middle_name: None,
            last_name: Some("Smith".to_string()),
            date_of_birth: None,
            arrest_summons_number: None,
        },
    )
    .with_cps_defendant_id(cps_defendant_id)
}

pub fn submission_timer(case_reference: &str, pending_type: PendingType) -> TimerKey {
    TimerKey::Submission {
        correlation_key: case_correlation_key(case_reference),
        pending_type,
    }
}

/// Handler plus handles on every in-memory collaborator behind it.
pub struct TestHarness {
    pub handler: CaseCommandHandler,
    pub store: Arc<InMemoryEventStore>,
    pub cases: Arc<InMemoryCaseLookup>,
    pub reference_data: Arc<StaticReferenceData>,
    pub validator: Arc<ScriptedFormValidator>,
    pub timers: Arc<RecordingTimerService>,
    pub statuses: Arc<SubmissionStatusProjector>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::for_test())
    }

    pub fn with_config(config: Config) -> Self {
        try_init_tracing();
        let store = Arc::new(InMemoryEventStore::new());
        let cases = Arc::new(InMemoryCaseLookup::new());
        let civil_override = config
            .reference_data
            .civil_offence_override
            .clone()
            .unwrap_or_default();
        let reference_data = Arc::new(
            StaticReferenceData::new([KNOWN_OFFENCE_CODE])
                .with_civil_codes(civil_override, [CIVIL_OFFENCE_CODE]),
        );
        let validator = Arc::new(ScriptedFormValidator::new());
        let timers = Arc::new(RecordingTimerService::new());
        let statuses = Arc::new(SubmissionStatusProjector::new());

        let handler = CaseCommandHandler::new(
            store.clone(),
            cases.clone(),
            reference_data.clone(),
            validator.clone(),
            timers.clone(),
            &config,
        )
        .with_projector(statuses.clone());

        Self {
            handler,
            store,
            cases,
            reference_data,
            validator,
            timers,
            statuses,
        }
    }

    /// Make `case_reference` resolvable with the given defendants.
    pub async fn register_case(
        &self,
        case_reference: &str,
        case_id: Uuid,
        is_civil: bool,
        defendants: Vec<CaseDefendant>,
    ) {
        self.cases
            .insert(
                case_reference,
                CaseRecord {
                    case_id,
                    is_civil,
                    defendants,
                },
            )
            .await;
    }

    pub fn submit(&self, kind: SubmissionKind, form: ReceivedForm) -> CaseCommand {
        CaseCommand::received(kind, form)
    }

    pub fn defendants_added(
        &self,
        case_reference: &str,
        case_id: Uuid,
        defendant_ids: Vec<Uuid>,
    ) -> CaseCommand {
        CaseCommand::RecordDefendantsAdded(DefendantsRecorded {
            case_reference: case_reference.to_string(),
            case_id,
            defendant_ids,
        })
    }

    pub fn expire(&self, case_reference: &str, pending_type: PendingType) -> CaseCommand {
        CaseCommand::timer_expired(pending_type, case_correlation_key(case_reference))
    }

    pub fn material(&self, case_reference: &str, case_id: Uuid, file_id: Uuid) -> MaterialRef {
        MaterialRef {
            case_reference: case_reference.to_string(),
            case_id,
            file_id,
            reason: None,
        }
    }

    pub fn eject(&self, case_reference: &str, case_id: Uuid) -> CaseCommand {
        CaseCommand::EjectCase(CaseEjected {
            case_reference: case_reference.to_string(),
            case_id,
        })
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
