// ==============================================
// BOUNDED CACHE INVARIANT TESTS (integration)
// ==============================================
//
// End-to-end behaviour of BoundedCache through its public API: size and
// capacity bounds, hit consistency, eviction order, and replay of source
// edits, both through `mutate` and through batches handed to `replay` by an
// external owner of the source.

use std::sync::{Arc, RwLock};

use seqcache::prelude::*;

/// Source owned elsewhere and edited without the cache's involvement.
#[derive(Clone, Default)]
struct SharedList {
    items: Arc<RwLock<Vec<String>>>,
}

impl SharedList {
    fn from_strs(items: &[&str]) -> Self {
        let items = items.iter().map(|s| s.to_string()).collect();
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    fn edit(&self, f: impl FnOnce(&mut Vec<String>)) {
        let mut items = self.items.write().unwrap();
        f(&mut items);
    }
}

impl Source for SharedList {
    type Value = String;

    fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    fn get(&self, position: usize) -> String {
        self.items.read().unwrap()[position].clone()
    }
}

// ==============================================
// Size and Capacity
// ==============================================

mod bounds {
    use super::*;

    #[test]
    fn len_tracks_source_through_edits() {
        let mut cache = BoundedCache::new(ListSource::from(vec![1, 2, 3]), 2);
        assert_eq!(cache.len(), 3);

        cache.mutate(|list| list.push(4)).unwrap();
        assert_eq!(cache.len(), 4);

        cache.mutate(|list| list.truncate(1)).unwrap();
        assert_eq!(cache.len(), 1);

        cache.mutate(|list| list.clear()).unwrap();
        assert!(cache.is_empty());
        assert!(cache.get(0).is_err());
        cache.check_invariants().unwrap();
    }

    #[test]
    fn never_holds_more_than_capacity() {
        let source: ListSource<u32> = (0..100).collect();
        let mut cache = BoundedCache::new(source, 7);
        for round in 0..3 {
            for p in (0..100).step_by(round + 1) {
                cache.get(p).unwrap();
                assert!(cache.cached_len() <= 7);
            }
        }
        assert_eq!(cache.cached_len(), 7);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn capacity_larger_than_sequence() {
        let mut cache = BoundedCache::new(ListSource::from(vec!['x', 'y']), 1_000_000);
        cache.get(0).unwrap();
        cache.get(1).unwrap();
        assert_eq!(cache.cached_len(), 2);
        assert_eq!(cache.stats().capacity, 1_000_000);
    }

    #[test]
    fn empty_source_has_no_readable_positions() {
        let mut cache = BoundedCache::new(ListSource::<u8>::new(), 4);
        assert_eq!(
            cache.get(0).unwrap_err(),
            CacheError::OutOfRange {
                position: 0,
                len: 0
            }
        );
        assert_eq!(cache.hit_ratio(), 0.0);
    }
}

// ==============================================
// Hits, Misses and Eviction Order
// ==============================================

mod hits_and_eviction {
    use super::*;

    #[test]
    fn repeated_get_does_not_reach_source() {
        let mut cache = BoundedCache::new(ListSource::from(vec!["p", "q", "r"]), 3);
        cache.get(1).unwrap();
        let fetches = cache.source().fetches();
        for _ in 0..10 {
            assert_eq!(*cache.get(1).unwrap(), "q");
        }
        assert_eq!(cache.source().fetches(), fetches);
        assert_eq!((cache.hits(), cache.misses()), (10, 1));
    }

    #[test]
    fn least_recently_used_goes_first() {
        let source: ListSource<u32> = (0..10).collect();
        let mut cache = BoundedCache::new(source, 3);
        cache.get(0).unwrap();
        cache.get(1).unwrap();
        cache.get(2).unwrap();
        cache.get(0).unwrap(); // 1 is now oldest

        cache.get(3).unwrap();
        assert!(!cache.is_cached(1));
        assert!(cache.is_cached(0) && cache.is_cached(2) && cache.is_cached(3));

        cache.get(4).unwrap();
        assert!(!cache.is_cached(2));

        assert_eq!(cache.recency_rank(0), Some(0));
        assert_eq!(cache.recency_rank(3), Some(1));
        assert_eq!(cache.recency_rank(4), Some(2));
    }

    #[test]
    fn recency_survives_position_shifts() {
        let source: ListSource<u32> = (0..6).collect();
        let mut cache = BoundedCache::new(source, 3);
        cache.get(4).unwrap();
        cache.get(1).unwrap();
        cache.get(5).unwrap();

        // Value 4 moves to position 2 and stays the oldest.
        cache.mutate(|list| {
            list.remove(0);
            list.remove(0);
        })
        .unwrap();
        assert_eq!(cache.cached_len(), 2);
        assert_eq!(cache.peek(2).as_deref(), Some(&4));
        assert_eq!(cache.recency_rank(2), Some(0));

        cache.get(0).unwrap();
        cache.get(1).unwrap();
        assert!(!cache.is_cached(2));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn capacity_two_scenario_hit_ratio() {
        let mut cache = BoundedCache::new(ListSource::from(vec!["a", "b", "c"]), 2);
        let reads: Vec<_> = [0, 1, 0, 2, 1]
            .into_iter()
            .map(|p| *cache.get(p).unwrap())
            .collect();
        assert_eq!(reads, vec!["a", "b", "a", "c", "b"]);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 4);
        assert!((cache.hit_ratio() - 0.2).abs() < 1e-12);
    }
}

// ==============================================
// Replay of Source Edits
// ==============================================

mod replay {
    use super::*;

    #[test]
    fn update_forces_refetch_of_new_value() {
        let mut cache = BoundedCache::new(ListSource::from(vec![10, 20, 30]), 3);
        for p in 0..3 {
            cache.get(p).unwrap();
        }
        cache.mutate(|list| list.set(1, 21)).unwrap();
        assert!(cache.is_cached(0) && !cache.is_cached(1) && cache.is_cached(2));
        assert_eq!(*cache.get(1).unwrap(), 21);
        assert_eq!(cache.misses(), 4);
    }

    #[test]
    fn delete_shifts_following_entries_down() {
        let source: ListSource<u32> = (0..8).collect();
        let mut cache = BoundedCache::new(source, 8);
        for p in [1, 3, 5, 7] {
            cache.get(p).unwrap();
        }
        cache.mutate(|list| list.remove(3)).unwrap();
        let cached: Vec<_> = (0..cache.len()).filter(|&p| cache.is_cached(p)).collect();
        assert_eq!(cached, vec![1, 4, 6]);
        assert_eq!(*cache.get(4).unwrap(), 5);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn batch_positions_are_progressive() {
        let shared = SharedList::from_strs(&["a", "b", "c", "d"]);
        let mut cache = BoundedCache::new(shared.clone(), 4);
        for p in 0..4 {
            cache.get(p).unwrap();
        }

        // [a b c d] -> delete 1 -> [a c d] -> delete 1 -> [a d] -> insert 0 -> [x a d]
        shared.edit(|items| {
            items.remove(1);
            items.remove(1);
            items.insert(0, "x".to_string());
        });
        cache
            .replay(&[Change::delete(1), Change::delete(1), Change::insert(0)])
            .unwrap();

        assert_eq!(cache.len(), 3);
        assert!(!cache.is_cached(0));
        assert_eq!(cache.peek(1).as_deref().map(String::as_str), Some("a"));
        assert_eq!(cache.peek(2).as_deref().map(String::as_str), Some("d"));
        assert_eq!(cache.get(0).unwrap().as_str(), "x");
        cache.check_invariants().unwrap();
    }

    #[test]
    fn misused_batch_resynchronizes_to_source() {
        let shared = SharedList::from_strs(&["a", "b", "c"]);
        let mut cache = BoundedCache::new(shared.clone(), 3);
        cache.get(0).unwrap();
        cache.get(2).unwrap();

        shared.edit(|items| items.push("d".to_string()));
        let err = cache.replay(&[]).unwrap_err();
        assert_eq!(
            err,
            CacheError::LengthMismatch {
                indexed: 3,
                expected: 4
            }
        );

        assert_eq!(cache.cached_len(), 0);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(3).unwrap().as_str(), "d");
        cache.check_invariants().unwrap();
    }

    #[test]
    fn unreplayed_edit_is_reported_on_next_get() {
        let shared = SharedList::from_strs(&["a", "b", "c", "d"]);
        let mut cache = BoundedCache::new(shared.clone(), 4);
        cache.get(0).unwrap();
        cache.get(3).unwrap();

        shared.edit(|items| items.push("e".to_string()));
        assert_eq!(
            cache.get(0).unwrap_err(),
            CacheError::LengthMismatch {
                indexed: 4,
                expected: 5
            }
        );
        assert_eq!(cache.cached_len(), 0);
        cache.check_invariants().unwrap();

        assert_eq!(cache.get(4).unwrap().as_str(), "e");
        assert_eq!(cache.get(0).unwrap().as_str(), "a");
        assert_eq!(cache.misses(), 4);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut cache = BoundedCache::new(ListSource::from(vec![1u8]), 2);
        let err = cache.replay(&[Change::insert(5)]).unwrap_err();
        assert!(matches!(err, CacheError::InvalidChange { len: 1, .. }));
        assert!(err.to_string().contains("insert at 5"));
    }

    #[test]
    fn retain_replays_many_deletes() {
        let source: ListSource<u32> = (0..20).collect();
        let mut cache = BoundedCache::new(source, 20);
        for p in 0..20 {
            cache.get(p).unwrap();
        }
        cache.mutate(|list| list.retain(|v| v % 3 == 0)).unwrap();
        assert_eq!(cache.len(), 7);
        assert_eq!(cache.cached_len(), 7);
        let values: Vec<_> = (0..7).map(|p| *cache.peek(p).unwrap()).collect();
        assert_eq!(values, vec![0, 3, 6, 9, 12, 15, 18]);
        cache.check_invariants().unwrap();
    }
}

// ==============================================
// Prefetch
// ==============================================

mod prefetch {
    use super::*;

    #[test]
    fn sequential_scan_with_read_ahead_mostly_hits() {
        let source: ListSource<u32> = (0..64).collect();
        let mut cache = BoundedCacheBuilder::new(8)
            .prefetch(ReadAhead::new(4))
            .build(source);
        for p in 0..64 {
            assert_eq!(*cache.get(p).unwrap(), p as u32);
        }
        // Every fifth read misses and pulls in the next four.
        assert_eq!(cache.misses(), 13);
        assert_eq!(cache.hits(), 51);
        assert_eq!(cache.prefetches(), 51);
        assert_eq!(cache.source().fetches(), 64);
        cache.check_invariants().unwrap();
    }
}
