//! Benchmarks for the item read paths.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use item_cache_service::cache::{CacheClient, MemoryStore};
use item_cache_service::items::pagination::paginate;
use item_cache_service::items::{
    Item, ItemRepository, ItemService, MemoryItemStore, NewItem, PageRequest,
};
use item_cache_service::telemetry::metrics::Metrics;

fn sample_items(n: usize) -> Vec<Item> {
    let now = Utc::now();
    (0..n)
        .map(|i| NewItem::new(format!("item-{i}"), 1.0 + i as f64).into_item(i.to_string(), now))
        .collect()
}

fn bench_paginate(c: &mut Criterion) {
    let items = sample_items(10_000);
    let request = PageRequest::new(50, 100).unwrap();

    c.bench_function("paginate_page_50_of_10k", |b| {
        b.iter(|| {
            let page = paginate(black_box(items.clone()), request);
            black_box(page);
        })
    });
}

fn bench_store_list(c: &mut Criterion) {
    let store = MemoryItemStore::new();
    for item in sample_items(10_000) {
        store.insert(item).unwrap();
    }

    c.bench_function("store_list_all_10k", |b| {
        b.iter(|| {
            let all = store.list_all().unwrap();
            black_box(all);
        })
    });
}

fn bench_cached_get(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = Arc::new(CacheClient::with_store(
        Arc::new(MemoryStore::new()),
        Duration::from_secs(1),
    ));
    let service = ItemService::new(
        Arc::new(MemoryItemStore::new()),
        cache,
        Arc::new(Metrics::new().unwrap()),
        Duration::from_secs(3600),
    );
    let item = runtime
        .block_on(service.create(NewItem::new("Widget", 9.99)))
        .unwrap();

    c.bench_function("service_get_cache_hit", |b| {
        b.iter(|| {
            let found = runtime.block_on(service.get(black_box(&item.id))).unwrap();
            black_box(found);
        })
    });
}

criterion_group!(benches, bench_paginate, bench_store_list, bench_cached_get);
criterion_main!(benches);
