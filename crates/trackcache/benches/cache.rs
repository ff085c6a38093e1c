use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use trackcache::{CacheableMapping, ChangeSet, TrackingCache};

#[derive(Clone)]
struct Row {
    id: u64,
    payload: Vec<u8>,
}

fn row(id: u64) -> Row {
    Row { id, payload: vec![b'x'; 1024] }
}

fn cache() -> TrackingCache<u64, Row> {
    TrackingCache::builder()
        .key_fn(|r: &Row| r.id)
        .build(CacheableMapping::new(
            |id: &u64| Ok(Some(row(*id))),
            || Ok((0..1000).map(row).collect()),
            |changes: &ChangeSet<Row>| {
                black_box(changes.len());
                Ok(())
            },
        ))
        .unwrap()
}

fn bench_cached_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_fetch");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_1kb_cached", |b| {
        let cache = cache();
        cache.fetch_all().unwrap();

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.fetch(&(counter % 1000)).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_fetch_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_miss");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_1kb_miss", |b| {
        let cache = cache();

        let mut counter = 0u64;
        b.iter(|| {
            // Every key is new, so every fetch goes to the loader
            black_box(cache.fetch(&counter).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_update_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_save");
    group.sample_size(50);
    group.throughput(Throughput::Elements(100));

    group.bench_function("update_100_then_save", |b| {
        let cache = cache();
        cache.fetch_all().unwrap();

        b.iter(|| {
            for id in 0..100 {
                let mut r = row(id);
                r.payload[0] = b'y';
                cache.update(r).unwrap();
            }
            cache.save().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cached_fetch, bench_fetch_miss, bench_update_save);
criterion_main!(benches);
