//! Case correlation: stable stream keys and case resolution.
//!
//! Submissions arrive addressed by a business reference (URN) that may not
//! name a known case yet. Everything about that reference lives on a
//! correlation stream whose root is derived from the reference alone.

use std::sync::Arc;

use md5::{Digest, Md5};
use tracing::debug;
use uuid::Uuid;

use crate::interfaces::{CaseLookup, CaseRecord, LookupError};
use crate::model::CaseDefendant;

/// Derive the correlation stream key for a case reference.
///
/// Name-based RFC 4122 type 3 UUID over the reference's UTF-8 bytes with no
/// namespace prefix: MD5 digest, then version and variant bits set. Must stay
/// bit-exact, persisted keys depend on it.
pub fn case_correlation_key(case_reference: &str) -> Uuid {
    let digest = Md5::digest(case_reference.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    uuid::Builder::from_md5_bytes(bytes).into_uuid()
}

/// A resolved case: its internal id, civil flag and defendant roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseHandle {
    pub case_id: Uuid,
    pub is_civil: bool,
    pub defendants: Vec<CaseDefendant>,
}

impl From<CaseRecord> for CaseHandle {
    fn from(record: CaseRecord) -> Self {
        Self {
            case_id: record.case_id,
            is_civil: record.is_civil,
            defendants: record.defendants,
        }
    }
}

/// Resolves case references against the case lookup collaborator.
#[derive(Clone)]
pub struct CaseCorrelator {
    lookup: Arc<dyn CaseLookup>,
}

impl CaseCorrelator {
    pub fn new(lookup: Arc<dyn CaseLookup>) -> Self {
        Self { lookup }
    }

    /// Look up the case for `case_reference`.
    ///
    /// `Ok(None)` means the case is not known yet. Blank references are never
    /// looked up.
    pub async fn resolve(&self, case_reference: &str) -> Result<Option<CaseHandle>, LookupError> {
        if case_reference.trim().is_empty() {
            return Ok(None);
        }
        let handle = self
            .lookup
            .by_reference(case_reference)
            .await?
            .map(CaseHandle::from);
        debug!(
            case_reference = %case_reference,
            resolved = handle.is_some(),
            "Resolved case reference"
        );
        Ok(handle)
    }
}
