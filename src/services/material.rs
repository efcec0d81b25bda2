//! Pending-material tracking.
//!
//! A pending material runs two timers, general and bulk-scan. Accepting or
//! rejecting any material, or ejecting the case, settles every outstanding
//! material of the case and cancels both timers for each. A timer that fires
//! while its material is still pending expires it.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::commands::{MaterialRef, MaterialTimerExpired};
use super::Decision;
use crate::aggregate::{
    CaseEvent, CaseState, MaterialExpired, MaterialPending, MaterialSettled, MaterialsReleased,
    ReleaseReason,
};
use crate::interfaces::TimerKey;
use crate::model::{codes, MaterialTimer, Problem};
use crate::reducer::TimerAction;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialExpiryTracker;

impl MaterialExpiryTracker {
    pub fn new() -> Self {
        Self
    }

    pub fn on_pending(&self, state: &CaseState, material: &MaterialRef) -> Decision {
        if state
            .material(material.file_id)
            .is_some_and(|m| m.status.is_pending())
        {
            debug!(file_id = %material.file_id, "Material already pending");
            return Decision::default();
        }

        let decision = Decision::default().with_event(CaseEvent::MaterialPending(MaterialPending {
            file_id: material.file_id,
            case_id: material.case_id,
            recorded_at: Utc::now(),
        }));
        MaterialTimer::BOTH.into_iter().fold(decision, |d, timer| {
            d.with_timer(TimerAction::Start(timer_key(
                material.file_id,
                material.case_id,
                timer,
            )))
        })
    }

    /// Accept (`accepted = true`) or reject a material.
    pub fn on_settled(&self, state: &CaseState, material: &MaterialRef, accepted: bool) -> Decision {
        if state
            .material(material.file_id)
            .is_some_and(|m| !m.status.is_pending())
        {
            debug!(file_id = %material.file_id, "Material already settled");
            return Decision::default();
        }

        let settled = MaterialSettled {
            file_id: material.file_id,
            case_id: material.case_id,
            reason: material.reason.clone(),
            settled_at: Utc::now(),
        };
        let event = if accepted {
            CaseEvent::MaterialAccepted(settled)
        } else {
            CaseEvent::MaterialRejected(settled)
        };
        info!(file_id = %material.file_id, accepted, "Material settled");

        let others: Vec<Uuid> = state
            .outstanding_materials(material.case_id)
            .into_iter()
            .filter(|id| *id != material.file_id)
            .collect();

        let decision = cancel_all(
            Decision::default().with_event(event),
            material.case_id,
            std::iter::once(material.file_id),
        );
        release(decision, material.case_id, others, ReleaseReason::MaterialSettled)
    }

    pub fn on_ejected(&self, state: &CaseState, case_id: Uuid) -> Decision {
        let outstanding = state.outstanding_materials(case_id);
        if outstanding.is_empty() {
            debug!(%case_id, "Case ejected with no outstanding material");
            return Decision::default();
        }
        info!(%case_id, count = outstanding.len(), "Case ejected; releasing material");
        release(
            Decision::default(),
            case_id,
            outstanding,
            ReleaseReason::CaseEjected,
        )
    }

    pub fn on_timer_fired(&self, state: &CaseState, fired: &MaterialTimerExpired) -> Decision {
        if !state
            .material(fired.file_id)
            .is_some_and(|m| m.status.is_pending())
        {
            debug!(
                file_id = %fired.file_id,
                timer = %fired.timer,
                "Material timer fired after settlement; ignoring"
            );
            return Decision::default();
        }

        info!(file_id = %fired.file_id, timer = %fired.timer, "Pending material expired");
        let problem = Problem::new(codes::MATERIAL_EXPIRED)
            .with_value("fileId", fired.file_id.to_string())
            .with_value("timer", fired.timer.to_string());

        let decision = Decision::default().with_event(CaseEvent::MaterialExpired(MaterialExpired {
            file_id: fired.file_id,
            case_id: fired.case_id,
            timer: fired.timer,
            problem,
            expired_at: Utc::now(),
        }));
        MaterialTimer::BOTH
            .into_iter()
            .filter(|t| *t != fired.timer)
            .fold(decision, |d, sibling| {
                d.with_timer(TimerAction::Cancel(timer_key(
                    fired.file_id,
                    fired.case_id,
                    sibling,
                )))
            })
    }
}

fn timer_key(file_id: Uuid, case_id: Uuid, timer: MaterialTimer) -> TimerKey {
    TimerKey::Material {
        file_id,
        case_id,
        timer,
    }
}

fn cancel_all(
    decision: Decision,
    case_id: Uuid,
    file_ids: impl IntoIterator<Item = Uuid>,
) -> Decision {
    file_ids.into_iter().fold(decision, |d, file_id| {
        MaterialTimer::BOTH.into_iter().fold(d, |d, timer| {
            d.with_timer(TimerAction::Cancel(timer_key(file_id, case_id, timer)))
        })
    })
}

fn release(
    decision: Decision,
    case_id: Uuid,
    file_ids: Vec<Uuid>,
    reason: ReleaseReason,
) -> Decision {
    if file_ids.is_empty() {
        return decision;
    }
    let decision = cancel_all(decision, case_id, file_ids.iter().copied());
    decision.with_event(CaseEvent::MaterialsReleased(MaterialsReleased {
        case_id,
        file_ids,
        reason,
        released_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Aggregate;

    const CASE: Uuid = Uuid::from_u128(100);

    fn material(file: u128) -> MaterialRef {
        MaterialRef {
            case_reference: "TFL4359536".to_string(),
            case_id: CASE,
            file_id: Uuid::from_u128(file),
            reason: None,
        }
    }

    fn apply(state: CaseState, decision: &Decision) -> CaseState {
        state.apply_all(&decision.events)
    }

    fn cancelled(decision: &Decision) -> Vec<TimerKey> {
        decision
            .timers
            .iter()
            .filter_map(|t| match t {
                TimerAction::Cancel(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pending_starts_both_timers() {
        let tracker = MaterialExpiryTracker::new();
        let decision = tracker.on_pending(&CaseState::default(), &material(1));
        assert_eq!(decision.events.len(), 1);
        assert_eq!(
            decision.timers,
            vec![
                TimerAction::Start(timer_key(Uuid::from_u128(1), CASE, MaterialTimer::General)),
                TimerAction::Start(timer_key(Uuid::from_u128(1), CASE, MaterialTimer::BulkScan)),
            ]
        );
    }

    #[test]
    fn test_pending_twice_is_noop() {
        let tracker = MaterialExpiryTracker::new();
        let state = apply(
            CaseState::default(),
            &tracker.on_pending(&CaseState::default(), &material(1)),
        );
        assert!(tracker.on_pending(&state, &material(1)).is_empty());
    }

    #[test]
    fn test_accept_cancels_every_outstanding_material() {
        let tracker = MaterialExpiryTracker::new();
        let state = CaseState::default();
        let state = apply(state.clone(), &tracker.on_pending(&state, &material(1)));
        let state = apply(state.clone(), &tracker.on_pending(&state, &material(2)));

        let decision = tracker.on_settled(&state, &material(1), true);

        assert_eq!(cancelled(&decision).len(), 4);
        let state = apply(state, &decision);
        assert!(state.outstanding_materials(CASE).is_empty());
    }

    #[test]
    fn test_fired_timer_after_rejection_is_noop() {
        let tracker = MaterialExpiryTracker::new();
        let state = CaseState::default();
        let state = apply(state.clone(), &tracker.on_pending(&state, &material(1)));
        let state = apply(state.clone(), &tracker.on_settled(&state, &material(1), false));

        for timer in MaterialTimer::BOTH {
            let fired = MaterialTimerExpired {
                correlation_key: Uuid::nil(),
                file_id: Uuid::from_u128(1),
                case_id: CASE,
                timer,
            };
            assert!(tracker.on_timer_fired(&state, &fired).is_empty());
        }
    }

    #[test]
    fn test_fired_timer_while_pending_expires_and_cancels_sibling() {
        let tracker = MaterialExpiryTracker::new();
        let state = CaseState::default();
        let state = apply(state.clone(), &tracker.on_pending(&state, &material(1)));

        let decision = tracker.on_timer_fired(
            &state,
            &MaterialTimerExpired {
                correlation_key: Uuid::nil(),
                file_id: Uuid::from_u128(1),
                case_id: CASE,
                timer: MaterialTimer::General,
            },
        );

        assert!(matches!(decision.events[0], CaseEvent::MaterialExpired(_)));
        assert_eq!(
            cancelled(&decision),
            vec![timer_key(Uuid::from_u128(1), CASE, MaterialTimer::BulkScan)]
        );
    }

    #[test]
    fn test_eject_without_material_is_noop() {
        let tracker = MaterialExpiryTracker::new();
        assert!(tracker.on_ejected(&CaseState::default(), CASE).is_empty());
    }

    #[test]
    fn test_eject_releases_outstanding_material() {
        let tracker = MaterialExpiryTracker::new();
        let state = CaseState::default();
        let state = apply(state.clone(), &tracker.on_pending(&state, &material(1)));

        let decision = tracker.on_ejected(&state, CASE);

        assert_eq!(cancelled(&decision).len(), 2);
        let CaseEvent::MaterialsReleased(released) = &decision.events[0] else {
            panic!("expected release event");
        };
        assert_eq!(released.reason, ReleaseReason::CaseEjected);
    }
}
