//! Uploaded case material awaiting acceptance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two independent expiry timers run for each pending material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialTimer {
    General,
    BulkScan,
}

impl MaterialTimer {
    pub const BOTH: [MaterialTimer; 2] = [MaterialTimer::General, MaterialTimer::BulkScan];
}

impl fmt::Display for MaterialTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialTimer::General => f.write_str("GENERAL"),
            MaterialTimer::BulkScan => f.write_str("BULK_SCAN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialStatus {
    Pending,
    Accepted,
    Rejected,
    /// Timers cancelled because the case was ejected or another material on
    /// the case settled first.
    Released,
    Expired,
}

impl MaterialStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, MaterialStatus::Pending)
    }
}

/// A material file tracked on the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEntry {
    pub file_id: Uuid,
    pub case_id: Uuid,
    pub status: MaterialStatus,
    pub updated_at: DateTime<Utc>,
}
