//! Events recorded on a case correlation stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::PartyMatch;
use crate::model::{
    MaterialTimer, PendingType, Problem, RawSubmission, SubmissionKind, SubmissionStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "kebab-case")]
pub enum CaseEvent {
    SubmissionProcessed(SubmissionProcessed),
    DefendantsAdded(DefendantsAdded),
    MaterialPending(MaterialPending),
    MaterialAccepted(MaterialSettled),
    MaterialRejected(MaterialSettled),
    MaterialsReleased(MaterialsReleased),
    MaterialExpired(MaterialExpired),
}

impl CaseEvent {
    /// Stored event type name.
    ///
    /// Submission outcomes are named per kind (`pet-processed`, ...).
    pub fn event_type(&self) -> &'static str {
        match self {
            CaseEvent::SubmissionProcessed(e) => e.kind.outcome_event_name(),
            CaseEvent::DefendantsAdded(_) => "defendants-added",
            CaseEvent::MaterialPending(_) => "material-pending",
            CaseEvent::MaterialAccepted(_) => "material-accepted",
            CaseEvent::MaterialRejected(_) => "material-rejected",
            CaseEvent::MaterialsReleased(_) => "materials-released",
            CaseEvent::MaterialExpired(_) => "material-expired",
        }
    }

    pub fn as_submission_processed(&self) -> Option<&SubmissionProcessed> {
        match self {
            CaseEvent::SubmissionProcessed(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome of processing one submission (PET, BCM, PTPH, COTR, Update-COTR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionProcessed {
    pub submission_id: Uuid,
    pub kind: SubmissionKind,
    pub case_reference: String,
    /// Absent while pending.
    pub case_id: Option<Uuid>,
    pub status: SubmissionStatus,
    pub normalized_form: Option<serde_json::Value>,
    pub defendants: Vec<PartyMatch>,
    #[serde(default)]
    pub errors: Vec<Problem>,
    #[serde(default)]
    pub warnings: Vec<Problem>,
    /// Kept only while pending, for replay once the case resolves.
    #[serde(default)]
    pub raw_submission: Option<RawSubmission>,
    pub processed_at: DateTime<Utc>,
}

impl SubmissionProcessed {
    pub fn pending_type(&self) -> PendingType {
        self.kind.pending_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendantsAdded {
    pub case_id: Uuid,
    pub defendant_ids: Vec<Uuid>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPending {
    pub file_id: Uuid,
    pub case_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSettled {
    pub file_id: Uuid,
    pub case_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
    pub settled_at: DateTime<Utc>,
}

/// Why outstanding materials had their timers cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    CaseEjected,
    MaterialSettled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsReleased {
    pub case_id: Uuid,
    pub file_ids: Vec<Uuid>,
    pub reason: ReleaseReason,
    pub released_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialExpired {
    pub file_id: Uuid,
    pub case_id: Uuid,
    pub timer: MaterialTimer,
    pub problem: Problem,
    pub expired_at: DateTime<Utc>,
}
