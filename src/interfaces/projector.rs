//! In-process projector interface.
//!
//! Projectors consume case events after they are persisted and build read
//! models from them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::CaseEvent;

/// Result type for projector operations.
pub type Result<T> = std::result::Result<T, ProjectorError>;

/// Errors from projector operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectorError {
    #[error("Projection failed: {0}")]
    Failed(String),
}

/// In-process projector interface.
///
/// The `project` method takes `&self`; projectors that keep state use
/// interior mutability.
#[async_trait]
pub trait Projector: Send + Sync {
    /// Name of this projector.
    fn name(&self) -> &str;

    /// Project events just appended to the stream `correlation_key`.
    async fn project(&self, correlation_key: Uuid, events: &[CaseEvent]) -> Result<()>;
}
