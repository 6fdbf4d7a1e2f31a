#![no_main]

use libfuzzer_sys::fuzz_target;
use seqcache::policy::bounded::BoundedCache;
use seqcache::source::{Change, ListSource};

// Fuzz arbitrary reads, edits and raw batches on BoundedCache
//
// Source edits go through `mutate`; raw `replay` calls with made-up batches
// must either succeed or leave the cache empty and aligned with the source.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = usize::from(data[0] % 8) + 1;
    let initial = usize::from(data[1] % 24);
    let mut model: Vec<u16> = (0..initial as u16).collect();
    let mut cache = BoundedCache::new(ListSource::from(model.clone()), capacity);
    let mut next_value = initial as u16;

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 6;
        let pos = usize::from(data[idx + 1]);
        idx += 2;

        match op {
            0 | 1 => {
                // get
                match cache.get(pos) {
                    Ok(value) => assert_eq!(*value, model[pos]),
                    Err(_) => assert!(pos >= model.len()),
                }
            }
            2 => {
                // insert through the source
                let pos = pos % (model.len() + 1);
                next_value = next_value.wrapping_add(1);
                model.insert(pos, next_value);
                cache.mutate(|list| list.insert(pos, next_value)).unwrap();
            }
            3 => {
                // delete through the source
                if model.is_empty() {
                    continue;
                }
                let pos = pos % model.len();
                model.remove(pos);
                cache.mutate(|list| list.remove(pos)).unwrap();
            }
            4 => {
                // update through the source
                if model.is_empty() {
                    continue;
                }
                let pos = pos % model.len();
                next_value = next_value.wrapping_add(1);
                model[pos] = next_value;
                cache.mutate(|list| list.set(pos, next_value)).unwrap();
                assert!(!cache.is_cached(pos));
            }
            _ => {
                // raw batch that does not change the source
                let batch = [Change::insert(pos % 32), Change::delete(pos % 32)];
                if cache.replay(&batch).is_err() {
                    assert_eq!(cache.cached_len(), 0);
                }
            }
        }

        assert_eq!(cache.len(), model.len());
        assert!(cache.cached_len() <= capacity);
        cache.check_invariants().unwrap();
        for (p, expected) in model.iter().enumerate() {
            if let Some(value) = cache.peek(p) {
                assert_eq!(*value, *expected);
            }
        }
    }
});
