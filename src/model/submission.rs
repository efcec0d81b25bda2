//! Submission kinds, pending slots, statuses, and raw payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::party::ExternalParty;

/// Form submitted through the CPS serve-material channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionKind {
    Pet,
    Bcm,
    Ptph,
    Cotr,
    UpdateCotr,
}

impl SubmissionKind {
    /// All kinds, in command-surface order.
    pub const ALL: [SubmissionKind; 5] = [
        SubmissionKind::Pet,
        SubmissionKind::Bcm,
        SubmissionKind::Ptph,
        SubmissionKind::Cotr,
        SubmissionKind::UpdateCotr,
    ];

    /// Pending slot this kind occupies on the case.
    ///
    /// Update-COTR shares the COTR slot.
    pub fn pending_type(self) -> PendingType {
        match self {
            SubmissionKind::Pet => PendingType::Pet,
            SubmissionKind::Bcm => PendingType::Bcm,
            SubmissionKind::Ptph => PendingType::Ptph,
            SubmissionKind::Cotr | SubmissionKind::UpdateCotr => PendingType::Cotr,
        }
    }

    /// Name of the outcome event emitted for this kind.
    pub fn outcome_event_name(self) -> &'static str {
        match self {
            SubmissionKind::Pet => "pet-processed",
            SubmissionKind::Bcm => "bcm-processed",
            SubmissionKind::Ptph => "ptph-processed",
            SubmissionKind::Cotr => "cotr-processed",
            SubmissionKind::UpdateCotr => "update-cotr-processed",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionKind::Pet => "PET",
            SubmissionKind::Bcm => "BCM",
            SubmissionKind::Ptph => "PTPH",
            SubmissionKind::Cotr => "COTR",
            SubmissionKind::UpdateCotr => "UPDATE_COTR",
        };
        f.write_str(name)
    }
}

/// Per-case slot for a submission awaiting case resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingType {
    Pet,
    Bcm,
    Ptph,
    Cotr,
}

impl PendingType {
    pub const ALL: [PendingType; 4] = [
        PendingType::Pet,
        PendingType::Bcm,
        PendingType::Ptph,
        PendingType::Cotr,
    ];

    /// Command delivered by the timer engine when this slot expires.
    pub fn expiry_command(self) -> &'static str {
        match self {
            PendingType::Pet => "pet-reject-for-timer-expire",
            PendingType::Bcm => "bcm-reject-for-timer-expire",
            PendingType::Ptph => "ptph-reject-for-timer-expire",
            PendingType::Cotr => "cotr-reject-for-timer-expire",
        }
    }
}

impl fmt::Display for PendingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PendingType::Pet => "PET",
            PendingType::Bcm => "BCM",
            PendingType::Ptph => "PTPH",
            PendingType::Cotr => "COTR",
        };
        f.write_str(name)
    }
}

/// Outcome status of a single submission instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Success,
    SuccessWithWarnings,
    Rejected,
    Expired,
    Failed,
}

impl SubmissionStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }

    /// Whether downstream treats the submission as accepted.
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Success | SubmissionStatus::SuccessWithWarnings
        )
    }

    /// Only PENDING may move, and it may move anywhere (including PENDING,
    /// which re-records the same pending cycle).
    pub fn can_transition_to(self, _next: SubmissionStatus) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Success => "SUCCESS",
            SubmissionStatus::SuccessWithWarnings => "SUCCESS_WITH_WARNINGS",
            SubmissionStatus::Rejected => "REJECTED",
            SubmissionStatus::Expired => "EXPIRED",
            SubmissionStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Unmodified payload as received from the external channel.
///
/// Retained on the case only while its type is pending, so it can be
/// replayed once the case resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub submission_id: Uuid,
    pub kind: SubmissionKind,
    pub case_reference: String,
    #[serde(default)]
    pub form: serde_json::Value,
    #[serde(default)]
    pub parties: Vec<ExternalParty>,
    #[serde(default)]
    pub offence_codes: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl RawSubmission {
    /// Whether the submission carries a case reference that can ever be
    /// resolved.
    pub fn has_case_reference(&self) -> bool {
        !self.case_reference.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_cotr_shares_cotr_slot() {
        assert_eq!(SubmissionKind::UpdateCotr.pending_type(), PendingType::Cotr);
        assert_eq!(SubmissionKind::Cotr.pending_type(), PendingType::Cotr);
        assert_eq!(SubmissionKind::Pet.pending_type(), PendingType::Pet);
    }

    #[test]
    fn test_terminal_statuses_do_not_transition() {
        for status in [
            SubmissionStatus::Success,
            SubmissionStatus::SuccessWithWarnings,
            SubmissionStatus::Rejected,
            SubmissionStatus::Expired,
            SubmissionStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert!(!status.can_transition_to(SubmissionStatus::Pending));
            assert!(!status.can_transition_to(SubmissionStatus::Rejected));
        }
        assert!(SubmissionStatus::Pending.can_transition_to(SubmissionStatus::Expired));
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&SubmissionStatus::SuccessWithWarnings).unwrap();
        assert_eq!(json, "\"SUCCESS_WITH_WARNINGS\"");
        let kind: SubmissionKind = serde_json::from_str("\"UPDATE_COTR\"").unwrap();
        assert_eq!(kind, SubmissionKind::UpdateCotr);
    }

    #[test]
    fn test_blank_case_reference_is_unresolvable() {
        let raw = RawSubmission {
            submission_id: Uuid::new_v4(),
            kind: SubmissionKind::Pet,
            case_reference: "   ".to_string(),
            form: serde_json::Value::Null,
            parties: vec![],
            offence_codes: vec![],
            received_at: Utc::now(),
        };
        assert!(!raw.has_case_reference());
    }
}
