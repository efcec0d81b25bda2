//! In-memory collaborators for tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::{
    CaseLookup, CaseRecord, FormValidation, FormValidator, LookupError, ReferenceData,
    ReferenceDataError, TimerError, TimerKey, TimerMetadata, TimerService, ValidationRequest,
    ValidatorError,
};
use crate::model::{OffenceCode, Problem, SubmissionKind, SubmissionStatus};

/// Case lookup backed by a map of reference to case.
#[derive(Default)]
pub struct InMemoryCaseLookup {
    cases: RwLock<HashMap<String, CaseRecord>>,
    fail: RwLock<bool>,
    calls: RwLock<u32>,
}

impl InMemoryCaseLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, reference: impl Into<String>, record: CaseRecord) {
        self.cases.write().await.insert(reference.into(), record);
    }

    pub async fn remove(&self, reference: &str) {
        self.cases.write().await.remove(reference);
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn calls(&self) -> u32 {
        *self.calls.read().await
    }
}

#[async_trait]
impl CaseLookup for InMemoryCaseLookup {
    async fn by_reference(&self, reference: &str) -> Result<Option<CaseRecord>, LookupError> {
        *self.calls.write().await += 1;
        if *self.fail.read().await {
            return Err(LookupError::Unavailable("Mock case lookup failure".to_string()));
        }
        Ok(self.cases.read().await.get(reference).cloned())
    }
}

/// Reference data that knows a fixed set of offence codes, plus extra codes
/// valid only under a civil override.
#[derive(Default)]
pub struct StaticReferenceData {
    codes: HashSet<String>,
    civil_codes: HashMap<String, HashSet<String>>,
    fail: RwLock<bool>,
}

impl StaticReferenceData {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_civil_codes<I, S>(mut self, override_ref: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.civil_codes
            .entry(override_ref.into())
            .or_default()
            .extend(codes.into_iter().map(Into::into));
        self
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl ReferenceData for StaticReferenceData {
    async fn valid_offence_codes(
        &self,
        candidates: &[String],
        civil_override: Option<&str>,
    ) -> Result<Vec<OffenceCode>, ReferenceDataError> {
        if *self.fail.read().await {
            return Err(ReferenceDataError::Unavailable(
                "Mock reference data failure".to_string(),
            ));
        }
        let civil = civil_override.and_then(|r| self.civil_codes.get(r));
        Ok(candidates
            .iter()
            .filter(|c| self.codes.contains(*c) || civil.is_some_and(|set| set.contains(*c)))
            .map(OffenceCode::new)
            .collect())
    }
}

/// Form validator returning a scripted verdict per submission kind.
///
/// Without a script it echoes the form back as SUCCESS. Every request is
/// recorded for inspection.
#[derive(Default)]
pub struct ScriptedFormValidator {
    verdicts: RwLock<HashMap<SubmissionKind, (SubmissionStatus, Vec<Problem>)>>,
    failing: RwLock<HashSet<SubmissionKind>>,
    requests: RwLock<Vec<ValidationRequest>>,
}

impl ScriptedFormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_verdict(
        &self,
        kind: SubmissionKind,
        status: SubmissionStatus,
        problems: Vec<Problem>,
    ) {
        self.verdicts.write().await.insert(kind, (status, problems));
    }

    pub async fn set_fail(&self, kind: SubmissionKind, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(kind);
        } else {
            failing.remove(&kind);
        }
    }

    pub async fn requests(&self) -> Vec<ValidationRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl FormValidator for ScriptedFormValidator {
    async fn rebuild(&self, request: ValidationRequest) -> Result<FormValidation, ValidatorError> {
        self.requests.write().await.push(request.clone());
        if self.failing.read().await.contains(&request.kind) {
            return Err(ValidatorError::Unavailable(format!(
                "Mock validator failure for {}",
                request.kind
            )));
        }

        let (status, problems) = self
            .verdicts
            .read()
            .await
            .get(&request.kind)
            .cloned()
            .unwrap_or((SubmissionStatus::Success, Vec::new()));

        let (errors, warnings) = match status {
            SubmissionStatus::SuccessWithWarnings => (Vec::new(), problems),
            _ => (problems, Vec::new()),
        };
        Ok(FormValidation {
            normalized_form: Some(request.form),
            status,
            errors,
            warnings,
        })
    }
}

/// Timer service that records active timers and every call.
#[derive(Default)]
pub struct RecordingTimerService {
    active: RwLock<BTreeMap<TimerKey, TimerMetadata>>,
    starts: RwLock<Vec<TimerKey>>,
    cancels: RwLock<Vec<TimerKey>>,
    fail: RwLock<bool>,
}

impl RecordingTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn active(&self) -> BTreeMap<TimerKey, TimerMetadata> {
        self.active.read().await.clone()
    }

    pub async fn is_active(&self, key: &TimerKey) -> bool {
        self.active.read().await.contains_key(key)
    }

    pub async fn starts(&self) -> Vec<TimerKey> {
        self.starts.read().await.clone()
    }

    pub async fn cancels(&self) -> Vec<TimerKey> {
        self.cancels.read().await.clone()
    }

    /// Remove an active timer as the engine does when it fires, returning
    /// what it would deliver.
    pub async fn fire(&self, key: &TimerKey) -> Option<TimerMetadata> {
        self.active.write().await.remove(key)
    }
}

#[async_trait]
impl TimerService for RecordingTimerService {
    async fn start(&self, key: TimerKey, metadata: TimerMetadata) -> Result<(), TimerError> {
        if *self.fail.read().await {
            return Err(TimerError::Unavailable("Mock timer failure".to_string()));
        }
        self.starts.write().await.push(key);
        self.active.write().await.insert(key, metadata);
        Ok(())
    }

    async fn cancel(&self, key: TimerKey) -> Result<(), TimerError> {
        if *self.fail.read().await {
            return Err(TimerError::Unavailable("Mock timer failure".to_string()));
        }
        self.cancels.write().await.push(key);
        self.active.write().await.remove(&key);
        Ok(())
    }
}
