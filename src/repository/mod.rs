//! Generic apply-and-persist repository.
//!
//! Any aggregate whose state is a pure fold over its events gets loading and
//! optimistic-concurrency persistence from [`AggregateRepository`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::interfaces::{EventStore, NewEvent, StorageError};

/// Event-sourced aggregate state.
pub trait Aggregate: Default + Clone + Send + Sync + 'static {
    /// Storage domain the aggregate's streams live under.
    const DOMAIN: &'static str;

    type Event: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Stored type name for `event`.
    fn event_type(event: &Self::Event) -> &'static str;

    /// Pure state transition.
    fn apply(self, event: &Self::Event) -> Self;

    /// Fold `events` over `self`.
    fn apply_all<'a>(self, events: impl IntoIterator<Item = &'a Self::Event>) -> Self
    where
        Self::Event: 'a,
    {
        events.into_iter().fold(self, |state, event| state.apply(event))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to (de)serialize {event_type} event: {source}")]
    Serialization {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Storage(e) if e.is_conflict())
    }
}

/// Aggregate state rebuilt from its stream.
#[derive(Debug, Clone)]
pub struct Loaded<A> {
    pub root: Uuid,
    pub state: A,
    /// Stream version the state was rebuilt at.
    pub version: u64,
}

/// Loads and persists one aggregate type.
pub struct AggregateRepository<A> {
    event_store: Arc<dyn EventStore>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> Clone for AggregateRepository<A> {
    fn clone(&self) -> Self {
        Self {
            event_store: self.event_store.clone(),
            _aggregate: PhantomData,
        }
    }
}

impl<A: Aggregate> AggregateRepository<A> {
    pub fn new(event_store: Arc<dyn EventStore>) -> Self {
        Self {
            event_store,
            _aggregate: PhantomData,
        }
    }

    /// Rebuild state for `root` by replaying its whole stream.
    pub async fn load(&self, root: Uuid) -> Result<Loaded<A>, RepositoryError> {
        let stored = self.event_store.load(A::DOMAIN, root).await?;
        let version = stored.len() as u64;

        let mut state = A::default();
        for event in stored {
            let decoded: A::Event = serde_json::from_value(event.payload).map_err(|source| {
                RepositoryError::Serialization {
                    event_type: event.event_type.clone(),
                    source,
                }
            })?;
            state = state.apply(&decoded);
        }

        debug!(domain = A::DOMAIN, %root, version, "Loaded aggregate");
        Ok(Loaded {
            root,
            state,
            version,
        })
    }

    /// Append `events` if the stream is still at `expected_version`.
    ///
    /// Returns the new version. An empty batch is not written.
    pub async fn persist(
        &self,
        root: Uuid,
        expected_version: u64,
        events: &[A::Event],
    ) -> Result<u64, RepositoryError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let encoded = events
            .iter()
            .map(|event| {
                let event_type = A::event_type(event);
                serde_json::to_value(event)
                    .map(|payload| NewEvent {
                        event_type: event_type.to_string(),
                        payload,
                    })
                    .map_err(|source| RepositoryError::Serialization {
                        event_type: event_type.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let version = self
            .event_store
            .append(A::DOMAIN, root, expected_version, encoded)
            .await?;
        debug!(domain = A::DOMAIN, %root, version, "Persisted events");
        Ok(version)
    }
}

#[cfg(test)]
mod tests;
