//! Domain types shared across the reconciler.

pub mod material;
pub mod party;
pub mod problem;
pub mod submission;
pub mod validation;

pub use material::{MaterialEntry, MaterialStatus, MaterialTimer};
pub use party::{CaseDefendant, DefendantDetails, ExternalParty, PersonDetails};
pub use problem::{codes, Problem, ProblemValue};
pub use submission::{PendingType, RawSubmission, SubmissionKind, SubmissionStatus};
pub use validation::{DefendantCorrelation, OffenceCode, ValidationData};
