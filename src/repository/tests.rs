use super::*;
use crate::storage::InMemoryEventStore;
use serde::Deserialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "kebab-case")]
enum TallyEvent {
    Added { amount: u32 },
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Tally(u32);

impl Aggregate for Tally {
    const DOMAIN: &'static str = "tally";
    type Event = TallyEvent;

    fn event_type(event: &TallyEvent) -> &'static str {
        match event {
            TallyEvent::Added { .. } => "added",
            TallyEvent::Reset => "reset",
        }
    }

    fn apply(self, event: &TallyEvent) -> Self {
        match event {
            TallyEvent::Added { amount } => Tally(self.0 + amount),
            TallyEvent::Reset => Tally(0),
        }
    }
}

fn repository() -> (Arc<InMemoryEventStore>, AggregateRepository<Tally>) {
    let store = Arc::new(InMemoryEventStore::new());
    let repo = AggregateRepository::new(store.clone() as Arc<dyn EventStore>);
    (store, repo)
}

#[tokio::test]
async fn test_load_empty_stream_is_default_state() {
    let (_, repo) = repository();
    let loaded = repo.load(Uuid::new_v4()).await.unwrap();
    assert_eq!(loaded.state, Tally(0));
    assert_eq!(loaded.version, 0);
}

#[tokio::test]
async fn test_persist_then_load_folds_events() {
    let (_, repo) = repository();
    let root = Uuid::new_v4();

    let version = repo
        .persist(
            root,
            0,
            &[
                TallyEvent::Added { amount: 2 },
                TallyEvent::Reset,
                TallyEvent::Added { amount: 5 },
            ],
        )
        .await
        .unwrap();
    assert_eq!(version, 3);

    let loaded = repo.load(root).await.unwrap();
    assert_eq!(loaded.state, Tally(5));
    assert_eq!(loaded.version, 3);
}

#[tokio::test]
async fn test_persist_stale_version_conflicts() {
    let (_, repo) = repository();
    let root = Uuid::new_v4();
    repo.persist(root, 0, &[TallyEvent::Reset]).await.unwrap();

    let err = repo
        .persist(root, 0, &[TallyEvent::Added { amount: 1 }])
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_persist_empty_batch_writes_nothing() {
    let (store, repo) = repository();
    let root = Uuid::new_v4();
    assert_eq!(repo.persist(root, 0, &[]).await.unwrap(), 0);
    assert!(store.load(Tally::DOMAIN, root).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_event_types_come_from_aggregate() {
    let (store, repo) = repository();
    let root = Uuid::new_v4();
    repo.persist(root, 0, &[TallyEvent::Added { amount: 1 }])
        .await
        .unwrap();
    let stored = store.load(Tally::DOMAIN, root).await.unwrap();
    assert_eq!(stored[0].event_type, "added");
    assert_eq!(stored[0].sequence, 0);
}

#[tokio::test]
async fn test_undecodable_payload_is_serialization_error() {
    let (store, repo) = repository();
    let root = Uuid::new_v4();
    store
        .append(
            Tally::DOMAIN,
            root,
            0,
            vec![NewEvent {
                event_type: "added".to_string(),
                payload: serde_json::json!({"eventType": "unknown"}),
            }],
        )
        .await
        .unwrap();

    let err = repo.load(root).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Serialization { ref event_type, .. } if event_type == "added"));
}
