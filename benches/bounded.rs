use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seqcache::policy::bounded::BoundedCache;
use seqcache::policy::prefetch::ReadAhead;
use seqcache::source::ListSource;

const LEN: u64 = 50_000;
const CAPACITY: usize = 1024;

fn source() -> ListSource<u64> {
    (0..LEN).collect()
}

fn bench_bounded_hot_set_hits(c: &mut Criterion) {
    c.bench_function("bounded_hot_set_hits", |b| {
        b.iter_batched(
            || {
                let mut cache = BoundedCache::new(source(), CAPACITY);
                for p in 0..CAPACITY {
                    cache.get(p).unwrap();
                }
                cache
            },
            |mut cache| {
                for p in 0..CAPACITY {
                    let _ = std::hint::black_box(cache.get(std::hint::black_box(p)));
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_bounded_random_eviction_churn(c: &mut Criterion) {
    c.bench_function("bounded_random_eviction_churn", |b| {
        b.iter_batched(
            || (BoundedCache::new(source(), CAPACITY), StdRng::seed_from_u64(3)),
            |(mut cache, mut rng)| {
                for _ in 0..4096 {
                    let p = rng.gen_range(0..LEN as usize);
                    let _ = std::hint::black_box(cache.get(p));
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_bounded_sequential_read_ahead(c: &mut Criterion) {
    c.bench_function("bounded_sequential_read_ahead", |b| {
        b.iter_batched(
            || BoundedCache::with_prefetch(source(), CAPACITY, ReadAhead::new(32)),
            |mut cache| {
                for p in 0..8192 {
                    let _ = std::hint::black_box(cache.get(p));
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_bounded_replay_front_edits(c: &mut Criterion) {
    c.bench_function("bounded_replay_front_edits", |b| {
        b.iter_batched(
            || {
                let mut cache = BoundedCache::new(source(), CAPACITY);
                for p in (0..LEN as usize).step_by(48) {
                    cache.get(p).unwrap();
                }
                cache
            },
            |mut cache| {
                for i in 0..512u64 {
                    cache
                        .mutate(|list| {
                            if i % 2 == 0 {
                                list.insert(0, i);
                            } else {
                                list.remove(0);
                            }
                        })
                        .unwrap();
                }
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_bounded_hot_set_hits,
    bench_bounded_random_eviction_churn,
    bench_bounded_sequential_read_ahead,
    bench_bounded_replay_front_edits
);
criterion_main!(benches);
