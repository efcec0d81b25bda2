//! In-process projectors.

pub mod submission_status;

pub use submission_status::{SubmissionRecord, SubmissionStatusProjector};
