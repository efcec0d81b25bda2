//! Commands accepted by a case correlation stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::correlation::case_correlation_key;
use crate::model::{ExternalParty, MaterialTimer, PendingType, RawSubmission, SubmissionKind};

/// A form as received from the external channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedForm {
    pub submission_id: Uuid,
    pub case_reference: String,
    #[serde(default)]
    pub form: serde_json::Value,
    #[serde(default)]
    pub parties: Vec<ExternalParty>,
    #[serde(default)]
    pub offence_codes: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl ReceivedForm {
    pub fn into_raw(self, kind: SubmissionKind) -> RawSubmission {
        RawSubmission {
            submission_id: self.submission_id,
            kind,
            case_reference: self.case_reference,
            form: self.form,
            parties: self.parties,
            offence_codes: self.offence_codes,
            received_at: self.received_at,
        }
    }
}

/// Delivered by the timer engine when a pending submission's timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerExpired {
    pub correlation_key: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendantsRecorded {
    pub case_reference: String,
    pub case_id: Uuid,
    pub defendant_ids: Vec<Uuid>,
}

/// Addresses one uploaded material on a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRef {
    pub case_reference: String,
    pub case_id: Uuid,
    pub file_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseEjected {
    pub case_reference: String,
    pub case_id: Uuid,
}

/// Delivered by the timer engine when a material timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTimerExpired {
    pub correlation_key: Uuid,
    pub file_id: Uuid,
    pub case_id: Uuid,
    pub timer: MaterialTimer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum CaseCommand {
    ProcessReceivedPet(ReceivedForm),
    ProcessReceivedBcm(ReceivedForm),
    ProcessReceivedPtph(ReceivedForm),
    ProcessReceivedCotr(ReceivedForm),
    ProcessReceivedUpdateCotr(ReceivedForm),
    PetRejectForTimerExpire(TimerExpired),
    BcmRejectForTimerExpire(TimerExpired),
    PtphRejectForTimerExpire(TimerExpired),
    CotrRejectForTimerExpire(TimerExpired),
    RecordDefendantsAdded(DefendantsRecorded),
    AddPendingMaterial(MaterialRef),
    AcceptMaterial(MaterialRef),
    RejectMaterial(MaterialRef),
    EjectCase(CaseEjected),
    ExpireMaterial(MaterialTimerExpired),
}

impl CaseCommand {
    /// Build the expiry command for `pending_type`.
    pub fn timer_expired(pending_type: PendingType, correlation_key: Uuid) -> Self {
        let payload = TimerExpired { correlation_key };
        match pending_type {
            PendingType::Pet => CaseCommand::PetRejectForTimerExpire(payload),
            PendingType::Bcm => CaseCommand::BcmRejectForTimerExpire(payload),
            PendingType::Ptph => CaseCommand::PtphRejectForTimerExpire(payload),
            PendingType::Cotr => CaseCommand::CotrRejectForTimerExpire(payload),
        }
    }

    pub fn received(kind: SubmissionKind, form: ReceivedForm) -> Self {
        match kind {
            SubmissionKind::Pet => CaseCommand::ProcessReceivedPet(form),
            SubmissionKind::Bcm => CaseCommand::ProcessReceivedBcm(form),
            SubmissionKind::Ptph => CaseCommand::ProcessReceivedPtph(form),
            SubmissionKind::Cotr => CaseCommand::ProcessReceivedCotr(form),
            SubmissionKind::UpdateCotr => CaseCommand::ProcessReceivedUpdateCotr(form),
        }
    }

    /// The submission kind and form, for `process-received-*` commands.
    pub fn as_received(&self) -> Option<(SubmissionKind, &ReceivedForm)> {
        match self {
            CaseCommand::ProcessReceivedPet(f) => Some((SubmissionKind::Pet, f)),
            CaseCommand::ProcessReceivedBcm(f) => Some((SubmissionKind::Bcm, f)),
            CaseCommand::ProcessReceivedPtph(f) => Some((SubmissionKind::Ptph, f)),
            CaseCommand::ProcessReceivedCotr(f) => Some((SubmissionKind::Cotr, f)),
            CaseCommand::ProcessReceivedUpdateCotr(f) => Some((SubmissionKind::UpdateCotr, f)),
            _ => None,
        }
    }

    /// The expired pending type, for `*-reject-for-timer-expire` commands.
    pub fn as_timer_expired(&self) -> Option<PendingType> {
        match self {
            CaseCommand::PetRejectForTimerExpire(_) => Some(PendingType::Pet),
            CaseCommand::BcmRejectForTimerExpire(_) => Some(PendingType::Bcm),
            CaseCommand::PtphRejectForTimerExpire(_) => Some(PendingType::Ptph),
            CaseCommand::CotrRejectForTimerExpire(_) => Some(PendingType::Cotr),
            _ => None,
        }
    }

    /// Root of the correlation stream this command addresses.
    pub fn stream_root(&self) -> Uuid {
        match self {
            CaseCommand::ProcessReceivedPet(f)
            | CaseCommand::ProcessReceivedBcm(f)
            | CaseCommand::ProcessReceivedPtph(f)
            | CaseCommand::ProcessReceivedCotr(f)
            | CaseCommand::ProcessReceivedUpdateCotr(f) => case_correlation_key(&f.case_reference),
            CaseCommand::PetRejectForTimerExpire(t)
            | CaseCommand::BcmRejectForTimerExpire(t)
            | CaseCommand::PtphRejectForTimerExpire(t)
            | CaseCommand::CotrRejectForTimerExpire(t) => t.correlation_key,
            CaseCommand::RecordDefendantsAdded(d) => case_correlation_key(&d.case_reference),
            CaseCommand::AddPendingMaterial(m)
            | CaseCommand::AcceptMaterial(m)
            | CaseCommand::RejectMaterial(m) => case_correlation_key(&m.case_reference),
            CaseCommand::EjectCase(e) => case_correlation_key(&e.case_reference),
            CaseCommand::ExpireMaterial(m) => m.correlation_key,
        }
    }

    /// Command name as delivered on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            CaseCommand::ProcessReceivedPet(_) => "process-received-pet",
            CaseCommand::ProcessReceivedBcm(_) => "process-received-bcm",
            CaseCommand::ProcessReceivedPtph(_) => "process-received-ptph",
            CaseCommand::ProcessReceivedCotr(_) => "process-received-cotr",
            CaseCommand::ProcessReceivedUpdateCotr(_) => "process-received-update-cotr",
            CaseCommand::PetRejectForTimerExpire(_) => PendingType::Pet.expiry_command(),
            CaseCommand::BcmRejectForTimerExpire(_) => PendingType::Bcm.expiry_command(),
            CaseCommand::PtphRejectForTimerExpire(_) => PendingType::Ptph.expiry_command(),
            CaseCommand::CotrRejectForTimerExpire(_) => PendingType::Cotr.expiry_command(),
            CaseCommand::RecordDefendantsAdded(_) => "record-defendants-added",
            CaseCommand::AddPendingMaterial(_) => "add-pending-material",
            CaseCommand::AcceptMaterial(_) => "accept-material",
            CaseCommand::RejectMaterial(_) => "reject-material",
            CaseCommand::EjectCase(_) => "eject-case",
            CaseCommand::ExpireMaterial(_) => EXPIRE_MATERIAL_COMMAND,
        }
    }
}

/// Command delivered when either material timer fires.
pub const EXPIRE_MATERIAL_COMMAND: &str = "expire-material";
