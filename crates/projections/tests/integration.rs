//! Integration tests: catalog services → commit listeners → all three views.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use common::{AggregateId, CatalogSettings, Currency, Locale};
use domain::{
    AuthorService, BookDetails, BookService, CategoryService, CommandContext, CreateAuthor,
    CreateBook, CreateCategory, CreatePublisher, Prices, PublisherService, RestoreBook,
    SoftDeleteBook, Translations, UpdateBook,
};
use event_store::{InMemoryEventStore, ObservedEventStore};
use projections::{
    BookDocument, BookQuery, CatalogViews, Projection, ProjectionListener, ProjectionProcessor,
    ProjectionWorker, ReferenceKind, WorkerHandle,
};

type Store = ObservedEventStore<InMemoryEventStore>;

struct Catalog {
    inner: InMemoryEventStore,
    views: CatalogViews,
    worker: WorkerHandle,
    books: BookService<Store>,
    authors: AuthorService<Store>,
    publishers: PublisherService<Store>,
    categories: CategoryService<Store>,
}

/// Wires the views to the commit path the same way the server does.
fn setup() -> Catalog {
    let settings = Arc::new(CatalogSettings::default());
    let views = CatalogViews::new(settings.clone());

    let mut worker = ProjectionWorker::new();
    for projection in views.asynchronous() {
        worker = worker.with_projection(projection);
    }
    let (feed, worker) = worker.spawn();

    let inner = InMemoryEventStore::new();
    let store = ObservedEventStore::new(inner.clone())
        .with_listener(Arc::new(ProjectionListener::new(views.synchronous())))
        .with_listener(Arc::new(feed));

    Catalog {
        inner,
        views,
        worker,
        books: BookService::new(store.clone(), settings.clone()),
        authors: AuthorService::new(store.clone(), settings.clone()),
        publishers: PublisherService::new(store.clone()),
        categories: CategoryService::new(store, settings),
    }
}

fn en(text: &str) -> Translations {
    Translations::new().with(Locale::parse("en").unwrap(), text)
}

fn details(
    title: &str,
    publisher_id: Option<AggregateId>,
    authors: &[AggregateId],
    categories: &[AggregateId],
) -> BookDetails {
    BookDetails {
        title: en(title),
        description: Translations::new(),
        isbn: "978-0-441-01359-3".to_string(),
        publisher_id,
        author_ids: authors.iter().copied().collect(),
        category_ids: categories.iter().copied().collect(),
        prices: Prices::new().with(Currency::parse("EUR").unwrap(), 1099),
    }
}

async fn create_author(catalog: &Catalog, name: &str) -> AggregateId {
    let cmd = CreateAuthor::new(name, Translations::new());
    let id = cmd.author_id;
    catalog
        .authors
        .create_author(cmd, &CommandContext::new())
        .await
        .unwrap();
    id
}

async fn create_book(
    catalog: &Catalog,
    title: &str,
    publisher_id: Option<AggregateId>,
    authors: &[AggregateId],
    categories: &[AggregateId],
) -> AggregateId {
    let cmd = CreateBook::new(details(title, publisher_id, authors, categories));
    let id = cmd.book_id;
    catalog
        .books
        .create_book(cmd, &CommandContext::new())
        .await
        .unwrap();
    id
}

/// Recomputes per-reference counts from the book documents.
fn expected_counts(docs: &[BookDocument]) -> HashMap<(ReferenceKind, AggregateId), u64> {
    let mut counts = HashMap::new();
    for doc in docs.iter().filter(|d| !d.lifecycle.is_deleted()) {
        let refs = doc.references();
        for id in refs.author_ids {
            *counts.entry((ReferenceKind::Author, id)).or_insert(0) += 1;
        }
        for id in refs.category_ids {
            *counts.entry((ReferenceKind::Category, id)).or_insert(0) += 1;
        }
        if let Some(id) = refs.publisher_id {
            *counts.entry((ReferenceKind::Publisher, id)).or_insert(0) += 1;
        }
    }
    counts
}

fn all_books() -> BookQuery {
    BookQuery {
        include_deleted: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn synchronous_views_are_read_your_writes() {
    let catalog = setup();
    let author = create_author(&catalog, "Stanisław Lem").await;

    let book = create_book(&catalog, "Solaris", None, &[author], &[]).await;

    let doc = catalog.views.books.get(book).await.unwrap();
    assert_eq!(doc.authors[0].name.as_deref(), Some("Stanisław Lem"));
    assert!(catalog.views.directory.get_author(author).await.is_some());
    catalog.worker.shutdown().await;
}

#[tokio::test]
async fn statistics_match_active_books_after_quiescence() {
    let catalog = setup();
    let a = create_author(&catalog, "A").await;
    let b = create_author(&catalog, "B").await;
    let publisher_cmd = CreatePublisher::new("Gollancz");
    let publisher = publisher_cmd.publisher_id;
    catalog
        .publishers
        .create_publisher(publisher_cmd, &CommandContext::new())
        .await
        .unwrap();
    let category_cmd = CreateCategory::new(en("Science Fiction"));
    let category = category_cmd.category_id;
    catalog
        .categories
        .create_category(category_cmd, &CommandContext::new())
        .await
        .unwrap();

    let first = create_book(&catalog, "One", Some(publisher), &[a], &[category]).await;
    let second = create_book(&catalog, "Two", Some(publisher), &[a, b], &[category]).await;
    let third = create_book(&catalog, "Three", None, &[b], &[]).await;

    catalog
        .books
        .update_book(
            UpdateBook {
                book_id: first,
                details: details("One", None, &[b], &[category]),
            },
            &CommandContext::new(),
        )
        .await
        .unwrap();
    catalog
        .books
        .soft_delete_book(SoftDeleteBook { book_id: second }, &CommandContext::new())
        .await
        .unwrap();
    catalog
        .books
        .soft_delete_book(SoftDeleteBook { book_id: third }, &CommandContext::new())
        .await
        .unwrap();
    catalog
        .books
        .restore_book(RestoreBook { book_id: third }, &CommandContext::new())
        .await
        .unwrap();

    catalog.worker.shutdown().await;

    let docs = catalog.views.books.search(&all_books()).await;
    let expected = expected_counts(&docs);
    let actual: HashMap<_, _> = catalog
        .views
        .statistics
        .all()
        .await
        .into_iter()
        .map(|s| ((s.kind, s.id), s.active_books))
        .collect();

    assert_eq!(actual, expected);
    assert_eq!(
        catalog
            .views
            .statistics
            .active_books(ReferenceKind::Author, b)
            .await,
        2
    );
    assert_eq!(
        catalog
            .views
            .statistics
            .active_books(ReferenceKind::Publisher, publisher)
            .await,
        0
    );
}

#[tokio::test]
async fn rebuild_reproduces_incremental_state() {
    let catalog = setup();
    let author = create_author(&catalog, "Octavia E. Butler").await;
    let kindred = create_book(&catalog, "Kindred", None, &[author], &[]).await;
    create_book(&catalog, "Dawn", None, &[author], &[]).await;
    catalog
        .books
        .soft_delete_book(SoftDeleteBook { book_id: kindred }, &CommandContext::new())
        .await
        .unwrap();
    catalog.worker.shutdown().await;

    let strip = |docs: Vec<BookDocument>| -> Vec<_> {
        docs.into_iter()
            .map(|d| (d.id, d.title, d.authors, d.lifecycle, d.version))
            .collect()
    };
    let before_books = strip(catalog.views.books.search(&all_books()).await);
    let before_stats = catalog.views.statistics.all().await;

    let mut processor = ProjectionProcessor::new(catalog.inner.clone());
    for projection in catalog.views.all() {
        processor.register(projection);
    }
    processor.rebuild_all().await.unwrap();
    processor.rebuild_all().await.unwrap();

    assert_eq!(strip(catalog.views.books.search(&all_books()).await), before_books);
    assert_eq!(catalog.views.statistics.all().await, before_stats);
}

#[tokio::test]
async fn rebuild_of_single_view_leaves_others_intact() {
    let catalog = setup();
    let author = create_author(&catalog, "Iain M. Banks").await;
    create_book(&catalog, "Excession", None, &[author], &[]).await;
    catalog.worker.shutdown().await;

    let mut processor = ProjectionProcessor::new(catalog.inner.clone());
    for projection in catalog.views.all() {
        processor.register(projection);
    }
    processor.rebuild("BookStatisticsView").await.unwrap();

    assert_eq!(
        catalog
            .views
            .statistics
            .active_books(ReferenceKind::Author, author)
            .await,
        1
    );
    assert_eq!(catalog.views.books.search(&BookQuery::default()).await.len(), 1);
}

#[tokio::test]
async fn catch_up_builds_views_for_existing_log() {
    let catalog = setup();
    let author = create_author(&catalog, "N. K. Jemisin").await;
    create_book(&catalog, "The Fifth Season", None, &[author], &[]).await;
    catalog.worker.shutdown().await;

    let fresh = CatalogViews::new(Arc::new(CatalogSettings::default()));
    let mut processor = ProjectionProcessor::new(catalog.inner.clone());
    for projection in fresh.all() {
        processor.register(projection);
    }
    processor.run_catch_up().await.unwrap();

    let docs = fresh.books.search(&BookQuery::default()).await;
    let authors: BTreeSet<_> = docs[0].authors.iter().map(|a| a.id).collect();
    assert_eq!(authors, BTreeSet::from([author]));
    assert_eq!(
        fresh
            .statistics
            .active_books(ReferenceKind::Author, author)
            .await,
        1
    );
}

#[tokio::test]
async fn rebuild_converges_with_a_commit_between_reset_and_replay() {
    let catalog = setup();
    let (a, b, c) = (AggregateId::new(), AggregateId::new(), AggregateId::new());
    create_book(&catalog, "One", None, &[a], &[]).await;
    create_book(&catalog, "Two", None, &[b], &[]).await;
    catalog.worker.shutdown().await;

    let statistics = catalog.views.statistics.clone();
    statistics.reset().await.unwrap();

    // Applied live before the replay streams the log.
    let three = catalog
        .books
        .create_book(
            CreateBook::new(details("Three", None, &[c], &[])),
            &CommandContext::new(),
        )
        .await
        .unwrap();
    for envelope in &three.envelopes {
        statistics.handle(envelope).await.unwrap();
    }

    let mut processor = ProjectionProcessor::new(catalog.inner.clone());
    for projection in catalog.views.all() {
        processor.register(projection);
    }
    processor.run_catch_up().await.unwrap();

    for author in [a, b, c] {
        assert_eq!(
            statistics.active_books(ReferenceKind::Author, author).await,
            1
        );
    }
    assert_eq!(catalog.views.books.search(&BookQuery::default()).await.len(), 3);
}
