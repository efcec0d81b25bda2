//! Inputs handed to the external form validator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An offence code confirmed by reference data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenceCode {
    pub code: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl OffenceCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: None,
        }
    }
}

/// Links the submitter's defendant id to the case's internal defendant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendantCorrelation {
    pub external_defendant_id: String,
    pub internal_defendant_id: Uuid,
}

/// Valid offence codes plus the defendant correlation table.
///
/// The correlation table is empty while the case is unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    pub offence_codes: Vec<OffenceCode>,
    pub defendant_ids: Vec<DefendantCorrelation>,
}

impl ValidationData {
    pub fn is_offence_code_valid(&self, code: &str) -> bool {
        self.offence_codes.iter().any(|c| c.code == code)
    }

    pub fn internal_id_for(&self, external_defendant_id: &str) -> Option<Uuid> {
        self.defendant_ids
            .iter()
            .find(|c| c.external_defendant_id == external_defendant_id)
            .map(|c| c.internal_defendant_id)
    }
}
