//! Expiry timer durations.

use std::time::Duration;

use serde::Deserialize;

use crate::model::MaterialTimer;

/// Default time a submission may stay pending before it expires (7 days).
pub const DEFAULT_SUBMISSION_EXPIRY_MINUTES: u64 = 7 * 24 * 60;
/// Default time uploaded material may await acceptance (7 days).
pub const DEFAULT_GENERAL_MATERIAL_EXPIRY_MINUTES: u64 = 7 * 24 * 60;
/// Default time bulk-scanned material may await acceptance (1 day).
pub const DEFAULT_BULK_SCAN_EXPIRY_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub submission_expiry_minutes: u64,
    pub general_material_expiry_minutes: u64,
    pub bulk_scan_expiry_minutes: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            submission_expiry_minutes: DEFAULT_SUBMISSION_EXPIRY_MINUTES,
            general_material_expiry_minutes: DEFAULT_GENERAL_MATERIAL_EXPIRY_MINUTES,
            bulk_scan_expiry_minutes: DEFAULT_BULK_SCAN_EXPIRY_MINUTES,
        }
    }
}

impl TimerConfig {
    pub fn submission_expiry(&self) -> Duration {
        minutes(self.submission_expiry_minutes)
    }

    pub fn material_expiry(&self, timer: MaterialTimer) -> Duration {
        match timer {
            MaterialTimer::General => minutes(self.general_material_expiry_minutes),
            MaterialTimer::BulkScan => minutes(self.bulk_scan_expiry_minutes),
        }
    }
}

fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}
