use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, CommitListener, EventEnvelope, EventStoreExt, InMemoryEventStore,
    ObservedEventStore, Version, store::EventStore,
};

fn make_event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Book")
        .event_type(if version == 1 { "BookCreated" } else { "BookUpdated" })
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "type": "BookUpdated",
            "data": {
                "book_id": aggregate_id.to_string(),
                "title": {"en": "The Left Hand of Darkness"},
                "author_ids": ["00000000-0000-0000-0000-000000000001"]
            }
        }))
        .build()
}

struct NoopListener;

#[async_trait]
impl CommitListener for NoopListener {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn on_commit(&self, _events: &[EventEnvelope]) -> event_store::Result<()> {
        Ok(())
    }
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                store
                    .append(vec![make_event(agg_id, 1)], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let events: Vec<EventEnvelope> = (1..=10).map(|v| make_event(agg_id, v)).collect();
                store.append(events, AppendOptions::expect_new()).await.unwrap();
            });
        });
    });
}

fn bench_observed_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/observed_append_3_listeners", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = ObservedEventStore::new(InMemoryEventStore::new())
                    .with_listener(Arc::new(NoopListener))
                    .with_listener(Arc::new(NoopListener))
                    .with_listener(Arc::new(NoopListener));
                let agg_id = AggregateId::new();
                store
                    .append_event(make_event(agg_id, 1), AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_replay_prefix(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let agg_id = AggregateId::new();

    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
        store.append(events, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("event_store/get_events_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.get_events_for_aggregate(agg_id).await.unwrap();
            });
        });
    });

    c.bench_function("event_store/get_events_up_to_50", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .get_events_for_aggregate_up_to(agg_id, Version::new(50))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_stream_all_events(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        for _ in 0..10 {
            let agg_id = AggregateId::new();
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
            store.append(events, AppendOptions::new()).await.unwrap();
        }
    });

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = store.stream_all_events().await.unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_observed_append,
    bench_replay_prefix,
    bench_stream_all_events,
);
criterion_main!(benches);
