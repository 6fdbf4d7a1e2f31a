// ==============================================
// BOUNDED CACHE CONCURRENCY TESTS (integration)
// ==============================================
#![cfg(feature = "concurrency")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use seqcache::prelude::*;

mod shared_reads {
    use super::*;

    #[test]
    fn concurrent_gets_return_source_values() {
        let source: ListSource<u64> = (0..512).collect();
        let cache = ConcurrentBoundedCache::new(source, 64);
        let num_threads = 8;
        let reads_per_thread = 500;
        let mismatches = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let cache = cache.clone();
                let mismatches = mismatches.clone();

                thread::spawn(move || {
                    for i in 0..reads_per_thread {
                        let position = (thread_id * 31 + i * 7) % 512;
                        let value = cache.get(position).unwrap();
                        if *value != position as u64 {
                            mismatches.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(mismatches.load(Ordering::SeqCst), 0);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, (num_threads * reads_per_thread) as u64);
        assert!(cache.cached_len() <= 64);
        cache.check_invariants().unwrap();
    }
}

mod readers_and_writer {
    use super::*;

    #[test]
    fn replays_interleave_with_reads() {
        let source: ListSource<u64> = (0..100).collect();
        let cache = ConcurrentBoundedCache::new(source, 16);

        let writer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..200u64 {
                    cache
                        .mutate(|list| {
                            if i % 2 == 0 {
                                list.insert(0, 1_000 + i);
                            } else {
                                list.remove(0);
                            }
                        })
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|reader| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..1_000 {
                        // The length is 100 or 101; reading under the lock
                        // keeps the position valid.
                        cache.with_lock(|c| {
                            let position = (reader * 13 + i) % c.len();
                            let value = *c.get(position).unwrap();
                            assert_eq!(value, c.source().as_slice()[position]);
                        });
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(cache.len(), 100);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn clones_share_one_cache() {
        let cache = ConcurrentBoundedCache::new(ListSource::from(vec!['a', 'b']), 2);
        let other = cache.clone();
        cache.get(1).unwrap();
        assert!(other.peek(1).is_some());
        other.clear();
        assert_eq!(cache.cached_len(), 0);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn builder_produces_concurrent_cache() {
        let cache = BoundedCacheBuilder::new(4)
            .prefetch(ReadAhead::new(1))
            .try_build_concurrent(ListSource::from(vec![1, 2, 3]))
            .unwrap();
        cache.get(0).unwrap();
        assert_eq!(cache.cached_len(), 2);
        assert_eq!(cache.capacity(), 4);
    }
}
