//! The case correlation aggregate.
//!
//! One stream per case reference, rooted at the reference's correlation key.
//! The stream exists before the case does: submissions for an unknown case
//! park here as pending until defendants are added and they can be replayed.

mod events;
mod pending;

pub use events::{
    CaseEvent, DefendantsAdded, MaterialExpired, MaterialPending, MaterialSettled,
    MaterialsReleased, ReleaseReason, SubmissionProcessed,
};
pub use pending::{replay_all, PendingSet, ReplayReport};

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::model::{
    MaterialEntry, MaterialStatus, PendingType, RawSubmission, SubmissionStatus,
};
use crate::repository::Aggregate;

/// State of one case correlation stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseState {
    pub case_reference: Option<String>,
    /// Internal case id, once the case is known.
    pub case_id: Option<Uuid>,
    pub defendant_ids: BTreeSet<Uuid>,
    pub pending: PendingSet,
    /// Last-seen raw submission per pending type.
    pub raw_submissions: BTreeMap<PendingType, RawSubmission>,
    /// Terminal status per submission id.
    pub settled: BTreeMap<Uuid, SubmissionStatus>,
    pub materials: BTreeMap<Uuid, MaterialEntry>,
}

impl CaseState {
    pub fn is_linked(&self) -> bool {
        self.case_id.is_some()
    }

    pub fn is_pending(&self, pending_type: PendingType) -> bool {
        self.pending.contains(pending_type)
    }

    pub fn raw_submission(&self, pending_type: PendingType) -> Option<&RawSubmission> {
        self.raw_submissions.get(&pending_type)
    }

    pub fn settled_status(&self, submission_id: Uuid) -> Option<SubmissionStatus> {
        self.settled.get(&submission_id).copied()
    }

    pub fn material(&self, file_id: Uuid) -> Option<&MaterialEntry> {
        self.materials.get(&file_id)
    }

    /// File ids of materials still awaiting acceptance on `case_id`.
    pub fn outstanding_materials(&self, case_id: Uuid) -> Vec<Uuid> {
        self.materials
            .values()
            .filter(|m| m.case_id == case_id && m.status.is_pending())
            .map(|m| m.file_id)
            .collect()
    }

    fn apply_submission(mut self, event: &SubmissionProcessed) -> Self {
        let pending_type = event.pending_type();

        if self.case_reference.is_none() {
            self.case_reference = Some(event.case_reference.clone());
        }
        if let Some(case_id) = event.case_id {
            self.case_id = Some(case_id);
        }

        if event.status == SubmissionStatus::Pending {
            self.pending = self.pending.mark_pending(pending_type);
            if let Some(raw) = &event.raw_submission {
                self.raw_submissions.insert(pending_type, raw.clone());
            }
        } else {
            self.pending = self.pending.resolve(pending_type);
            self.raw_submissions.remove(&pending_type);
            self.settled.insert(event.submission_id, event.status);
        }
        self
    }

    fn set_material_status(
        mut self,
        file_id: Uuid,
        case_id: Uuid,
        status: MaterialStatus,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        self.materials.insert(
            file_id,
            MaterialEntry {
                file_id,
                case_id,
                status,
                updated_at: at,
            },
        );
        self
    }
}

impl Aggregate for CaseState {
    const DOMAIN: &'static str = "prosecution-case-urn";
    type Event = CaseEvent;

    fn event_type(event: &CaseEvent) -> &'static str {
        event.event_type()
    }

    fn apply(self, event: &CaseEvent) -> Self {
        match event {
            CaseEvent::SubmissionProcessed(e) => self.apply_submission(e),
            CaseEvent::DefendantsAdded(e) => {
                let mut next = self;
                next.case_id = Some(e.case_id);
                next.defendant_ids.extend(e.defendant_ids.iter().copied());
                next
            }
            CaseEvent::MaterialPending(e) => {
                self.set_material_status(e.file_id, e.case_id, MaterialStatus::Pending, e.recorded_at)
            }
            CaseEvent::MaterialAccepted(e) => {
                self.set_material_status(e.file_id, e.case_id, MaterialStatus::Accepted, e.settled_at)
            }
            CaseEvent::MaterialRejected(e) => {
                self.set_material_status(e.file_id, e.case_id, MaterialStatus::Rejected, e.settled_at)
            }
            CaseEvent::MaterialsReleased(e) => e.file_ids.iter().fold(self, |state, file_id| {
                state.set_material_status(*file_id, e.case_id, MaterialStatus::Released, e.released_at)
            }),
            CaseEvent::MaterialExpired(e) => {
                self.set_material_status(e.file_id, e.case_id, MaterialStatus::Expired, e.expired_at)
            }
        }
    }
}
