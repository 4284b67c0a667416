//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventQuery, EventStore, EventStoreError,
    EventStoreExt, PostgresEventStore, Version,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty log
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: AggregateId,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Book")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"test": true}))
        .build()
}

#[tokio::test]
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let event = create_test_event(aggregate_id, Version::first(), "BookCreated");
    let version = store
        .append(vec![event], AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::first());

    let events = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "BookCreated");
    assert_eq!(events[0].schema_version, 1);
}

#[tokio::test]
async fn append_multiple_events_atomically() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(aggregate_id, Version::new(1), "BookCreated"),
        create_test_event(aggregate_id, Version::new(2), "BookUpdated"),
        create_test_event(aggregate_id, Version::new(3), "BookSoftDeleted"),
    ];

    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(3));

    let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    let versions: Vec<i64> = stored.iter().map(|e| e.version.as_i64()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn stale_expected_version_conflicts() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "BookCreated")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(aggregate_id, Version::new(2), "BookUpdated")],
            AppendOptions::expect_version(Version::initial()),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
async fn unique_constraint_reports_conflict() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "BookCreated")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "BookCreated")],
            AppendOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
async fn racing_writers_exactly_one_wins() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();
    store
        .append(
            vec![create_test_event(aggregate_id, Version::first(), "BookCreated")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let a = store.clone();
    let b = store.clone();
    let first = tokio::spawn(async move {
        a.append(
            vec![create_test_event(aggregate_id, Version::new(2), "BookUpdated")],
            AppendOptions::expect_version(Version::first()),
        )
        .await
    });
    let second = tokio::spawn(async move {
        b.append(
            vec![create_test_event(aggregate_id, Version::new(2), "BookUpdated")],
            AppendOptions::expect_version(Version::first()),
        )
        .await
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        store.get_events_for_aggregate(aggregate_id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn get_events_up_to_version() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = (1..=3)
        .map(|v| create_test_event(aggregate_id, Version::new(v), "BookUpdated"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();

    let prefix = store
        .get_events_for_aggregate_up_to(aggregate_id, Version::new(2))
        .await
        .unwrap();

    assert_eq!(prefix.len(), 2);
    assert_eq!(prefix[1].version, Version::new(2));
}

#[tokio::test]
async fn query_events_with_filters() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = (1..=3)
        .map(|v| create_test_event(aggregate_id, Version::new(v), "BookUpdated"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();

    let query = EventQuery::for_aggregate(aggregate_id)
        .from_version(Version::new(2))
        .to_version(Version::new(2));

    let results = store.query_events(query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].version, Version::new(2));
}

#[tokio::test]
async fn query_events_with_limit_and_offset() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = (1..=5)
        .map(|v| create_test_event(aggregate_id, Version::new(v), "BookUpdated"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();

    let query = EventQuery::for_aggregate(aggregate_id).limit(2).offset(1);

    let results = store.query_events(query).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].version, Version::new(2));
    assert_eq!(results[1].version, Version::new(3));
}

#[tokio::test]
async fn correlation_and_causation_round_trip() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();
    let correlation = Uuid::new_v4();
    let causation = Uuid::new_v4();

    let event = EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Author")
        .event_type("AuthorCreated")
        .version(Version::first())
        .correlation_id(Some(correlation))
        .causation_id(Some(causation))
        .payload_raw(serde_json::json!({"name": "Ursula K. Le Guin"}))
        .metadata("tenant", serde_json::json!("default"))
        .build();
    store.append(vec![event], AppendOptions::new()).await.unwrap();

    let found = store
        .query_events(EventQuery::for_correlation(correlation))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].causation_id, Some(causation));
    assert_eq!(
        found[0].metadata.get("tenant"),
        Some(&serde_json::json!("default"))
    );
}

#[tokio::test]
async fn stream_all_events_in_commit_order() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    let id1 = AggregateId::new();
    let id2 = AggregateId::new();

    store
        .append(
            vec![create_test_event(id2, Version::first(), "AuthorCreated")],
            AppendOptions::new(),
        )
        .await
        .unwrap();
    store
        .append(
            vec![create_test_event(id1, Version::first(), "BookCreated")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let events: Vec<_> = store.stream_all_events().await.unwrap().collect().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_ref().unwrap().aggregate_id, id2);
    assert_eq!(events[1].as_ref().unwrap().aggregate_id, id1);
}

#[tokio::test]
async fn aggregate_exists_extension() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert!(!store.aggregate_exists(aggregate_id).await.unwrap());

    store
        .append_event(
            create_test_event(aggregate_id, Version::first(), "BookCreated"),
            AppendOptions::new(),
        )
        .await
        .unwrap();

    assert!(store.aggregate_exists(aggregate_id).await.unwrap());
}
