//! Abstract interfaces for the reconciler's collaborators.
//!
//! These traits define the contracts for:
//! - Case lookup by business reference
//! - Reference data (offence codes)
//! - Form validation and rebuilding
//! - Timer scheduling (start/cancel)
//! - Event storage (append-only, per-stream optimistic concurrency)
//! - Projectors (in-process read model builders)
//!
//! Implementations must be safely callable from concurrent tasks; the
//! reconciler holds them as shared trait objects.

pub mod case_lookup;
pub mod event_store;
pub mod form_validator;
pub mod projector;
pub mod reference_data;
pub mod timer_service;

pub use case_lookup::{CaseLookup, CaseRecord, LookupError};
pub use event_store::{EventStore, NewEvent, StorageError, StoredEvent};
pub use form_validator::{FormValidation, FormValidator, ValidationRequest, ValidatorError};
pub use projector::{Projector, ProjectorError};
pub use reference_data::{ReferenceData, ReferenceDataError};
pub use timer_service::{TimerError, TimerKey, TimerMetadata, TimerService};
