#![no_main]

use libfuzzer_sys::fuzz_target;
use seqcache::ds::SparseIndex;

// Fuzz arbitrary operation sequences on SparseIndex
//
// Mirrors every operation on a plain Vec<Option<u8>> and checks the two
// agree, along with the run-compression invariants.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let initial = usize::from(data[0] % 32);
    let mut index: SparseIndex<u8> = SparseIndex::with_empty(initial);
    let mut model: Vec<Option<u8>> = vec![None; initial];

    let mut idx = 1;
    while idx + 2 < data.len() {
        let op = data[idx] % 6;
        let pos = usize::from(data[idx + 1]);
        let value = data[idx + 2];
        let filled = value % 2 == 0;
        let payload = filled.then_some(value);
        idx += 3;

        match op {
            0 => {
                // insert
                let pos = pos % (model.len() + 1);
                index.insert(pos, payload);
                model.insert(pos, payload);
            }
            1 => {
                // remove
                if model.is_empty() {
                    continue;
                }
                let pos = pos % model.len();
                assert_eq!(index.remove(pos), model.remove(pos));
            }
            2 => {
                // set
                if model.is_empty() {
                    continue;
                }
                let pos = pos % model.len();
                let previous = std::mem::replace(&mut model[pos], payload);
                assert_eq!(index.set(pos, payload), previous);
            }
            3 => {
                // get / try_get
                if pos < model.len() {
                    assert_eq!(index.get(pos).copied(), model[pos]);
                } else {
                    assert!(index.try_get(pos).is_err());
                }
            }
            4 => {
                // node handle round trip
                if pos < model.len() {
                    if let Some(node) = index.node_at(pos) {
                        assert_eq!(index.position_of(node), pos);
                        assert_eq!(index.value(node).copied(), model[pos]);
                    } else {
                        assert!(model[pos].is_none());
                    }
                }
            }
            _ => {
                // reset
                if value % 16 == 0 {
                    let len = pos % 32;
                    index.reset(len);
                    model = vec![None; len];
                }
            }
        }

        assert_eq!(index.len(), model.len());
        assert_eq!(
            index.filled_len(),
            model.iter().filter(|slot| slot.is_some()).count()
        );
        index.check_invariants().unwrap();
    }

    let collected: Vec<Option<u8>> = index.iter().map(|slot| slot.copied()).collect();
    assert_eq!(collected, model);
});
