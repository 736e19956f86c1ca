use criterion::{criterion_group, criterion_main, Criterion};

use slidethumb::cache::ThumbnailCache;

fn bench_push_under_pressure(c: &mut Criterion) {
    // Budget fits ~16 entries; every push past that evicts.
    let cache = ThumbnailCache::new(16 * 64 * 1024);
    let blob = vec![0u8; 64 * 1024];

    let mut i = 0u64;
    c.bench_function("push_with_eviction", |b| {
        b.iter(|| {
            cache.push(&format!("http://localhost:3000/view?label=deck-{}", i % 64), blob.clone());
            i += 1;
        })
    });
}

fn bench_pull_hit(c: &mut Criterion) {
    let cache = ThumbnailCache::new(1024 * 1024);
    cache.push("http://localhost:3000/view?label=hot", vec![0u8; 64 * 1024]);

    c.bench_function("pull_hit", |b| {
        b.iter(|| cache.pull("http://localhost:3000/view?label=hot").unwrap())
    });
}

criterion_group!(benches, bench_push_under_pressure, bench_pull_hit);
criterion_main!(benches);
