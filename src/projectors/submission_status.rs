//! Latest status per submission.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::aggregate::CaseEvent;
use crate::interfaces::projector::{Projector, Result};
use crate::model::{SubmissionKind, SubmissionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub submission_id: Uuid,
    pub kind: SubmissionKind,
    pub correlation_key: Uuid,
    pub case_id: Option<Uuid>,
    pub status: SubmissionStatus,
    pub updated_at: DateTime<Utc>,
}

/// Read model of submission statuses.
///
/// Terminal statuses are final: a later event that would move a terminal
/// submission anywhere is logged and dropped.
#[derive(Default)]
pub struct SubmissionStatusProjector {
    records: RwLock<HashMap<Uuid, SubmissionRecord>>,
}

impl SubmissionStatusProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, submission_id: Uuid) -> Option<SubmissionRecord> {
        self.records.read().await.get(&submission_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn with_status(&self, status: SubmissionStatus) -> Vec<SubmissionRecord> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.updated_at);
        records
    }
}

#[async_trait]
impl Projector for SubmissionStatusProjector {
    fn name(&self) -> &str {
        "submission-status"
    }

    async fn project(&self, correlation_key: Uuid, events: &[CaseEvent]) -> Result<()> {
        let mut records = self.records.write().await;
        for processed in events.iter().filter_map(CaseEvent::as_submission_processed) {
            if let Some(existing) = records.get(&processed.submission_id) {
                if !existing.status.can_transition_to(processed.status) {
                    warn!(
                        submission_id = %processed.submission_id,
                        status = %existing.status,
                        attempted = %processed.status,
                        "Ignoring status regression for settled submission"
                    );
                    continue;
                }
            }
            records.insert(
                processed.submission_id,
                SubmissionRecord {
                    submission_id: processed.submission_id,
                    kind: processed.kind,
                    correlation_key,
                    case_id: processed.case_id,
                    status: processed.status,
                    updated_at: processed.processed_at,
                },
            );
        }
        Ok(())
    }
}
