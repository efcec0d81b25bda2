//! Form content validation and rebuilding.

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{Problem, SubmissionKind, SubmissionStatus, ValidationData};

/// Errors from the form validator collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("Form validator unavailable: {0}")]
    Unavailable(String),

    #[error("Form could not be rebuilt: {0}")]
    Unprocessable(String),
}

/// Everything the validator needs to normalize one submitted form.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub kind: SubmissionKind,
    pub form: serde_json::Value,
    pub validation_data: ValidationData,
    /// Absent while the case is unresolved.
    pub case_id: Option<Uuid>,
}

/// Normalized form plus the validator's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValidation {
    pub normalized_form: Option<serde_json::Value>,
    pub status: SubmissionStatus,
    pub errors: Vec<Problem>,
    pub warnings: Vec<Problem>,
}

/// Validates raw submitted forms and rebuilds them against a defendant
/// correlation table.
///
/// Must normalize structure even when the correlation table is empty.
#[async_trait]
pub trait FormValidator: Send + Sync {
    async fn rebuild(&self, request: ValidationRequest) -> Result<FormValidation, ValidatorError>;
}
