//! Reference data lookups.

use async_trait::async_trait;

use crate::model::OffenceCode;

/// Errors from the reference data collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("Reference data unavailable: {0}")]
    Unavailable(String),
}

/// Reference data service.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Filter `candidates` down to the offence codes reference data knows.
    ///
    /// When `civil_override` is set, codes valid under that civil override
    /// reference are accepted as well.
    async fn valid_offence_codes(
        &self,
        candidates: &[String],
        civil_override: Option<&str>,
    ) -> Result<Vec<OffenceCode>, ReferenceDataError>;
}
