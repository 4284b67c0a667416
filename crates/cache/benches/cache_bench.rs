use cache::{CacheKey, QueryCache, TierTtls};
use common::Locale;
use criterion::{Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

fn key(i: usize) -> CacheKey {
    CacheKey::new("books.search", &Locale::parse("en").unwrap(), "default")
        .param("q", "dune")
        .param("offset", i)
}

fn bench_l1_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = QueryCache::in_memory(TierTtls::default());
    rt.block_on(async {
        cache
            .set(&key(0), &vec!["a"; 20], &["Books".to_string()])
            .await
            .unwrap();
    });

    c.bench_function("cache/l1_hit", |b| {
        b.to_async(&rt).iter(|| async {
            cache.get::<Vec<String>>(&key(0)).await.unwrap();
        });
    });
}

fn bench_invalidate_1000_entries(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("cache/invalidate_1000_entries", |b| {
        b.to_async(&rt).iter(|| async {
            let cache = QueryCache::in_memory(TierTtls::default());
            for i in 0..1000 {
                cache.set(&key(i), &i, &["Books".to_string()]).await.unwrap();
            }
            cache.invalidate_tag("Books").await.unwrap();
        });
    });
}

criterion_group!(benches, bench_l1_hit, bench_invalidate_1000_entries);
criterion_main!(benches);
