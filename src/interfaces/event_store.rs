//! Event storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Sequence conflict on {domain}/{root}: expected version {expected}, stream is at {actual}")]
    SequenceConflict {
        domain: String,
        root: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("Event store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::SequenceConflict { .. })
    }
}

/// An event ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// An event as persisted in a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Zero-based position within the stream.
    pub sequence: u64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only event log with per-stream optimistic concurrency.
///
/// A stream is addressed by `(domain, root)`. Its version is the number of
/// events it holds.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append events if the stream is still at `expected_version`.
    ///
    /// Returns the new stream version.
    async fn append(
        &self,
        domain: &str,
        root: Uuid,
        expected_version: u64,
        events: Vec<NewEvent>,
    ) -> Result<u64>;

    /// Retrieve all events of a stream, oldest first.
    async fn load(&self, domain: &str, root: Uuid) -> Result<Vec<StoredEvent>>;

    /// List all stream roots in a domain.
    async fn list_roots(&self, domain: &str) -> Result<Vec<Uuid>>;
}
