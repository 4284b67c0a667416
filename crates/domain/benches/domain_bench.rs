use std::collections::BTreeSet;
use std::sync::Arc;

use common::{CatalogSettings, Currency, Locale};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Aggregate, Book, BookDetails, BookService, CommandContext, CommandHandler, CreateBook, Prices,
    Translations, UpdateBook,
};
use event_store::{ETag, InMemoryEventStore, store::EventStore};

fn details(title: &str) -> BookDetails {
    BookDetails {
        title: Translations::new().with(Locale::parse("en").unwrap(), title),
        description: Translations::new(),
        isbn: "0-306-40615-2".to_string(),
        publisher_id: None,
        author_ids: BTreeSet::new(),
        category_ids: BTreeSet::new(),
        prices: Prices::new().with(Currency::parse("EUR").unwrap(), 1999),
    }
}

fn bench_create_book(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let settings = Arc::new(CatalogSettings::default());

    c.bench_function("domain/create_book", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = BookService::new(InMemoryEventStore::new(), settings.clone());
                service
                    .create_book(CreateBook::new(details("Bench")), &CommandContext::new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_update_with_etag(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = BookService::new(
        InMemoryEventStore::new(),
        Arc::new(CatalogSettings::default()),
    );
    let cmd = CreateBook::new(details("Bench"));
    let book_id = cmd.book_id;
    let mut etag = rt
        .block_on(service.create_book(cmd, &CommandContext::new()))
        .unwrap()
        .etag();

    c.bench_function("domain/update_book_with_etag", |b| {
        b.iter(|| {
            let result = rt
                .block_on(service.update_book(
                    UpdateBook {
                        book_id,
                        details: details("Bench revised"),
                    },
                    &CommandContext::new().with_expected_etag(etag),
                ))
                .unwrap();
            etag = result.etag();
        });
    });
}

fn bench_replay_100_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let service = BookService::new(store.clone(), Arc::new(CatalogSettings::default()));
    let cmd = CreateBook::new(details("Edition 1"));
    let book_id = cmd.book_id;

    rt.block_on(async {
        service.create_book(cmd, &CommandContext::new()).await.unwrap();
        for edition in 2..=100 {
            service
                .update_book(
                    UpdateBook {
                        book_id,
                        details: details(&format!("Edition {edition}")),
                    },
                    &CommandContext::new(),
                )
                .await
                .unwrap();
        }
    });

    c.bench_function("domain/replay_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let envelopes = store.get_events_for_aggregate(book_id).await.unwrap();
                let book = CommandHandler::<InMemoryEventStore, Book>::hydrate(&envelopes).unwrap();
                assert_eq!(ETag::from_version(book.version()).to_header_value(), "\"100\"");
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_book,
    bench_update_with_etag,
    bench_replay_100_events,
);
criterion_main!(benches);
