//! Case lookup by business reference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::CaseDefendant;

/// Errors from the case lookup collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Case lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Case lookup returned malformed data: {0}")]
    Malformed(String),
}

/// A case known to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub case_id: Uuid,
    #[serde(default)]
    pub is_civil: bool,
    #[serde(default)]
    pub defendants: Vec<CaseDefendant>,
}

/// Queries known cases by their business reference (URN).
///
/// Pure query; never mutates.
#[async_trait]
pub trait CaseLookup: Send + Sync {
    /// Find the case for `reference`, if the system knows it yet.
    async fn by_reference(&self, reference: &str) -> Result<Option<CaseRecord>, LookupError>;
}
