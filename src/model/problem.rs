//! Problems reported on submission outcomes.

use serde::{Deserialize, Serialize};

/// Problem codes raised by the reconciler itself.
///
/// Validator-supplied problems carry their own codes.
pub mod codes {
    pub const CASE_URN_NOT_FOUND: &str = "CASE_URN_NOT_FOUND";
    pub const SUBMISSION_EXPIRED: &str = "SUBMISSION_EXPIRED";
    pub const SUBMISSION_SUPERSEDED: &str = "SUBMISSION_SUPERSEDED";
    pub const VALIDATION_UNAVAILABLE: &str = "VALIDATION_UNAVAILABLE";
    pub const MATERIAL_EXPIRED: &str = "MATERIAL_EXPIRED";
}

/// Key/value detail attached to a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemValue {
    pub key: String,
    pub value: String,
}

/// An error or warning on a submission outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub code: String,
    #[serde(default)]
    pub values: Vec<ProblemValue>,
}

impl Problem {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push(ProblemValue {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Look up the first value recorded under `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }
}
