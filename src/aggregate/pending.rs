//! Per-case set of submission types awaiting case resolution.

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::PendingType;
use crate::reducer::{ReduceError, Reduction};

/// Immutable set of pending types.
///
/// Every change yields a new set, so each transition is an event applied to
/// a prior snapshot rather than an in-place mutation. Iteration order is the
/// declaration order of [`PendingType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingSet(BTreeSet<PendingType>);

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `pending_type`; no-op when already present.
    #[must_use]
    pub fn mark_pending(&self, pending_type: PendingType) -> Self {
        let mut next = self.0.clone();
        next.insert(pending_type);
        Self(next)
    }

    /// Remove `pending_type`; no-op when absent.
    #[must_use]
    pub fn resolve(&self, pending_type: PendingType) -> Self {
        let mut next = self.0.clone();
        next.remove(&pending_type);
        Self(next)
    }

    pub fn contains(&self, pending_type: PendingType) -> bool {
        self.0.contains(&pending_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PendingType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<PendingType> for PendingSet {
    fn from_iter<I: IntoIterator<Item = PendingType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of replaying every pending type against a now-resolved case.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub reductions: Vec<Reduction>,
    pub failures: Vec<(PendingType, ReduceError)>,
    /// The pending set once terminal outcomes are applied.
    pub remaining: PendingSet,
}

impl ReplayReport {
    pub fn resolved(&self) -> Vec<PendingType> {
        self.reductions
            .iter()
            .filter(|r| !r.pending)
            .map(|r| r.outcome.pending_type())
            .collect()
    }
}

/// Re-run `resolver` for every type in `pending`.
///
/// Each type is reduced independently: a failure for one type is recorded
/// and leaves that type pending without affecting the others. Types whose
/// outcome is still pending stay in the set.
pub async fn replay_all<F, Fut>(pending: &PendingSet, mut resolver: F) -> ReplayReport
where
    F: FnMut(PendingType) -> Fut,
    Fut: Future<Output = Result<Reduction, ReduceError>>,
{
    let mut report = ReplayReport {
        remaining: pending.clone(),
        ..Default::default()
    };

    for pending_type in pending.iter() {
        match resolver(pending_type).await {
            Ok(reduction) => {
                if !reduction.pending {
                    report.remaining = report.remaining.resolve(pending_type);
                }
                report.reductions.push(reduction);
            }
            Err(e) => {
                warn!(
                    pending_type = %pending_type,
                    error = %e,
                    "Replay failed; type stays pending"
                );
                report.failures.push((pending_type, e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_pending_is_idempotent() {
        let set = PendingSet::new()
            .mark_pending(PendingType::Pet)
            .mark_pending(PendingType::Pet);
        assert_eq!(set.len(), 1);
        assert!(set.contains(PendingType::Pet));
    }

    #[test]
    fn test_resolve_absent_type_is_noop() {
        let set = PendingSet::new().mark_pending(PendingType::Bcm);
        let resolved = set.resolve(PendingType::Pet);
        assert_eq!(resolved, set);
    }

    #[test]
    fn test_transitions_leave_prior_snapshot_untouched() {
        let before = PendingSet::new().mark_pending(PendingType::Pet);
        let after = before.resolve(PendingType::Pet);
        assert!(before.contains(PendingType::Pet));
        assert!(after.is_empty());
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let set: PendingSet = [PendingType::Cotr, PendingType::Pet, PendingType::Bcm]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![PendingType::Pet, PendingType::Bcm, PendingType::Cotr]
        );
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let set = PendingSet::new().mark_pending(PendingType::Ptph);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[\"PTPH\"]");
    }
}
