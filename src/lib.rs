//! Serve-material reconciliation engine.
//!
//! Correlates forms (PET, BCM, PTPH, COTR, Update-COTR) and uploaded material
//! submitted against a prosecution case that may not exist locally yet.
//! Submissions for an unknown case park on a per-reference correlation
//! stream with an expiry timer, and are replayed once the case's defendants
//! are added.

pub mod aggregate;
pub mod clients;
pub mod config;
pub mod correlation;
pub mod interfaces;
pub mod matching;
pub mod model;
pub mod projectors;
pub mod reducer;
pub mod repository;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{CaseEvent, CaseState, PendingSet};
pub use config::Config;
pub use correlation::{case_correlation_key, CaseCorrelator, CaseHandle};
pub use matching::{IdentityMatcher, MatchOutcome};
pub use reducer::{SubmissionReducer, TimerAction};
pub use services::{CaseCommand, CaseCommandHandler, CommandOutcome, HandlerError};
