//! In-memory event store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interfaces::event_store::{EventStore, NewEvent, Result, StorageError, StoredEvent};

/// Event store holding every stream in memory.
///
/// Appends check the expected version under a single write lock, so
/// concurrent writers to one stream see a `SequenceConflict` rather than
/// interleaving.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<(String, Uuid), Vec<StoredEvent>>>,
    fail_on_append: RwLock<bool>,
    fail_on_load: RwLock<bool>,
    injected_conflicts: RwLock<u32>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_append(&self, fail: bool) {
        *self.fail_on_append.write().await = fail;
    }

    pub async fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.write().await = fail;
    }

    /// Make the next `count` appends fail with a sequence conflict.
    pub async fn inject_conflicts(&self, count: u32) {
        *self.injected_conflicts.write().await = count;
    }

    /// Number of events in a stream.
    pub async fn version(&self, domain: &str, root: Uuid) -> u64 {
        self.streams
            .read()
            .await
            .get(&(domain.to_string(), root))
            .map(|events| events.len() as u64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        domain: &str,
        root: Uuid,
        expected_version: u64,
        events: Vec<NewEvent>,
    ) -> Result<u64> {
        if *self.fail_on_append.read().await {
            return Err(StorageError::Unavailable(
                "In-memory store append disabled".to_string(),
            ));
        }

        let mut streams = self.streams.write().await;
        let stream = streams.entry((domain.to_string(), root)).or_default();
        let actual = stream.len() as u64;

        {
            let mut injected = self.injected_conflicts.write().await;
            if *injected > 0 {
                *injected -= 1;
                return Err(StorageError::SequenceConflict {
                    domain: domain.to_string(),
                    root,
                    expected: expected_version,
                    actual: actual + 1,
                });
            }
        }

        if actual != expected_version {
            return Err(StorageError::SequenceConflict {
                domain: domain.to_string(),
                root,
                expected: expected_version,
                actual,
            });
        }

        let recorded_at = Utc::now();
        stream.extend(events.into_iter().enumerate().map(|(i, event)| StoredEvent {
            sequence: actual + i as u64,
            event_type: event.event_type,
            payload: event.payload,
            recorded_at,
        }));
        Ok(stream.len() as u64)
    }

    async fn load(&self, domain: &str, root: Uuid) -> Result<Vec<StoredEvent>> {
        if *self.fail_on_load.read().await {
            return Err(StorageError::Unavailable(
                "In-memory store load disabled".to_string(),
            ));
        }
        Ok(self
            .streams
            .read()
            .await
            .get(&(domain.to_string(), root))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_roots(&self, domain: &str) -> Result<Vec<Uuid>> {
        let streams = self.streams.read().await;
        let mut roots: Vec<Uuid> = streams
            .keys()
            .filter(|(d, _)| d == domain)
            .map(|(_, root)| *root)
            .collect();
        roots.sort();
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str) -> NewEvent {
        NewEvent {
            event_type: name.to_string(),
            payload: json!({"name": name}),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_sequences() {
        let store = InMemoryEventStore::new();
        let root = Uuid::new_v4();

        assert_eq!(store.append("d", root, 0, vec![event("a"), event("b")]).await.unwrap(), 2);
        assert_eq!(store.append("d", root, 2, vec![event("c")]).await.unwrap(), 3);

        let events = store.load("d", root).await.unwrap();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(events[2].event_type, "c");
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = InMemoryEventStore::new();
        let root = Uuid::new_v4();
        store.append("d", root, 0, vec![event("a")]).await.unwrap();

        let err = store.append("d", root, 0, vec![event("b")]).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::SequenceConflict { expected: 0, actual: 1, .. }
        ));
        assert_eq!(store.version("d", root).await, 1);
    }

    #[tokio::test]
    async fn test_injected_conflicts_are_consumed() {
        let store = InMemoryEventStore::new();
        let root = Uuid::new_v4();
        store.inject_conflicts(1).await;

        assert!(store
            .append("d", root, 0, vec![event("a")])
            .await
            .unwrap_err()
            .is_conflict());
        assert_eq!(store.append("d", root, 0, vec![event("a")]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_streams_are_isolated_by_domain_and_root() {
        let store = InMemoryEventStore::new();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        store.append("d", a, 0, vec![event("a")]).await.unwrap();
        store.append("d", b, 0, vec![event("b")]).await.unwrap();
        store.append("other", a, 0, vec![event("c")]).await.unwrap();

        assert_eq!(store.list_roots("d").await.unwrap(), vec![a, b]);
        assert_eq!(store.load("other", a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_toggles() {
        let store = InMemoryEventStore::new();
        store.set_fail_on_load(true).await;
        assert!(store.load("d", Uuid::nil()).await.is_err());
        store.set_fail_on_append(true).await;
        assert!(!store
            .append("d", Uuid::nil(), 0, vec![event("a")])
            .await
            .unwrap_err()
            .is_conflict());
    }
}
