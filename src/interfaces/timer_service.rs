//! Timer scheduling interface.
//!
//! The timer engine owns wall-clock scheduling. When a timer fires it
//! delivers `TimerMetadata::expiry_command` back to the reconciler,
//! addressed by the timer key.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{MaterialTimer, PendingType};

/// Errors from the timer collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("Timer service unavailable: {0}")]
    Unavailable(String),
}

/// Identity of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerKey {
    /// Pending form submission on a case correlation stream.
    #[serde(rename_all = "camelCase")]
    Submission {
        correlation_key: Uuid,
        pending_type: PendingType,
    },
    /// Pending uploaded material.
    #[serde(rename_all = "camelCase")]
    Material {
        file_id: Uuid,
        case_id: Uuid,
        timer: MaterialTimer,
    },
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKey::Submission {
                correlation_key,
                pending_type,
            } => write!(f, "submission:{correlation_key}:{pending_type}"),
            TimerKey::Material {
                file_id,
                case_id,
                timer,
            } => write!(f, "material:{case_id}:{file_id}:{timer}"),
        }
    }
}

/// What to deliver when the timer fires, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerMetadata {
    pub expiry_command: String,
    /// Stream the expiry command is addressed to.
    pub correlation_key: Uuid,
    pub fire_after: Duration,
}

/// External timer engine.
///
/// `start` on an existing key replaces it; `cancel` on a missing key is a
/// no-op.
#[async_trait]
pub trait TimerService: Send + Sync {
    async fn start(&self, key: TimerKey, metadata: TimerMetadata) -> Result<(), TimerError>;

    async fn cancel(&self, key: TimerKey) -> Result<(), TimerError>;
}
