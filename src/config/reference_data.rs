//! Reference data options.

use serde::Deserialize;

/// Reference value that widens offence-code validity for civil cases.
pub const DEFAULT_CIVIL_OFFENCE_OVERRIDE: &str = "CIVIL_OFFENCE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReferenceDataConfig {
    /// Passed to reference data when the case is civil. `None` disables the
    /// override.
    pub civil_offence_override: Option<String>,
}

impl Default for ReferenceDataConfig {
    fn default() -> Self {
        Self {
            civil_offence_override: Some(DEFAULT_CIVIL_OFFENCE_OVERRIDE.to_string()),
        }
    }
}
