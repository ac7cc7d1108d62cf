// Property tests for SlotTable kept inside the crate since the table is
// not part of the public surface.

use crate::slot_table::{Slot, SlotTable};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

type Tuple = Vec<String>;

// Pool-indexed operations: indices shrink to earlier tuples, the pool
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Upsert(usize, i32),
    Remove(usize),
    Find(usize),
    Mutate(usize, i32),
    RetainEven,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Tuple>, Vec<OpI>)> {
    proptest::collection::vec(proptest::collection::vec("[a-c]{0,2}", 1..=3), 1..=8)
        .prop_flat_map(|pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Upsert(i, v)),
                2 => idx.clone().prop_map(OpI::Remove),
                2 => idx.clone().prop_map(OpI::Find),
                1 => (idx.clone(), -100i32..100).prop_map(|(i, d)| OpI::Mutate(i, d)),
                1 => Just(OpI::RetainEven),
                1 => Just(OpI::Iterate),
            ];
            proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
        })
}

// Drives a SlotTable the way MultiKeyMap does under the chaining policy
// and checks it against a HashMap keyed by the full tuple. `id_of` decides
// how often identifiers are shared.
fn run_chained(
    pool: &[Tuple],
    ops: Vec<OpI>,
    id_of: impl Fn(&[String]) -> u64,
) -> Result<(), TestCaseError> {
    let mut sut: SlotTable<String, i32> = SlotTable::new();
    let mut model: HashMap<Tuple, i32> = HashMap::new();
    let mut live: HashMap<Tuple, Slot> = HashMap::new();
    let mut stale: Vec<Slot> = Vec::new();

    for op in ops {
        match op {
            OpI::Upsert(i, v) => {
                let keys = pool[i].clone();
                let id = id_of(keys.as_slice());
                match sut.find(id, &keys) {
                    Some(slot) => {
                        prop_assert_eq!(live.get(&keys), Some(&slot));
                        let (old_k, old_v) = sut.replace(slot, keys.clone(), v).expect("live slot");
                        prop_assert_eq!(&old_k, &keys);
                        prop_assert_eq!(Some(old_v), model.insert(keys, v));
                    }
                    None => {
                        prop_assert!(!model.contains_key(&keys));
                        let slot = sut.insert(id, keys.clone(), v);
                        live.insert(keys.clone(), slot);
                        model.insert(keys, v);
                    }
                }
            }
            OpI::Remove(i) => {
                let keys = &pool[i];
                match sut.find(id_of(keys.as_slice()), keys) {
                    Some(slot) => {
                        let (kk, vv) = sut.remove(slot).expect("found slot removable");
                        prop_assert_eq!(&kk, keys);
                        prop_assert_eq!(Some(vv), model.remove(keys));
                        live.remove(keys);
                        stale.push(slot);
                    }
                    None => prop_assert!(!model.contains_key(keys)),
                }
            }
            OpI::Find(i) => {
                let keys = &pool[i];
                let found = sut.find(id_of(keys.as_slice()), keys);
                prop_assert_eq!(found.is_some(), model.contains_key(keys));
                if let Some(slot) = found {
                    prop_assert_eq!(Some(&slot), live.get(keys));
                    prop_assert_eq!(sut.get(slot).map(|e| e.value), model.get(keys).copied());
                }
            }
            OpI::Mutate(i, d) => {
                let keys = &pool[i];
                if let Some(&slot) = live.get(keys) {
                    let e = sut.get_mut(slot).expect("live slot resolves");
                    e.value = e.value.saturating_add(d);
                    if let Some(mv) = model.get_mut(keys) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            OpI::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                model.retain(|_, v| *v % 2 == 0);
                live.retain(|k, slot| {
                    if model.contains_key(k) {
                        true
                    } else {
                        stale.push(*slot);
                        false
                    }
                });
            }
            OpI::Iterate => {
                let s: BTreeSet<_> = sut.iter().map(|(_, e)| (e.keys.clone(), e.value)).collect();
                let m: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        for &slot in &stale {
            prop_assert!(sut.get(slot).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.index_len(), model.len());
        for (_, e) in sut.iter() {
            prop_assert_eq!(e.id, id_of(e.keys.as_slice()));
        }
    }
    Ok(())
}

fn spread_id(keys: &[String]) -> u64 {
    use std::hash::BuildHasher;
    rustc_hash::FxBuildHasher.hash_one(keys)
}

// Property: state-machine equivalence against a HashMap keyed by tuple.
// - Upserts overwrite in place; slots stay stable for live tuples.
// - `remove` returns the owned pair and invalidates the slot.
// - `retain` prunes storage and index together.
// - Every stored identifier matches the identifier of its tuple.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_chained(&pool, ops, spread_id)?;
    }
}

// Property: same invariants when every tuple shares one identifier, so
// lookups are resolved by tuple equality alone.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_chained(&pool, ops, |_| 0)?;
    }
}

// Property: with a handful of identifiers, `find_id` is some exactly when
// at least one live tuple maps to that identifier.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_find_id_tracks_live_identifiers((pool, ops) in arb_scenario()) {
        let id_of = |k: &[String]| k.len() as u64;
        let mut sut: SlotTable<String, i32> = SlotTable::new();
        let mut model: HashMap<Tuple, i32> = HashMap::new();
        for op in ops {
            match op {
                OpI::Upsert(i, v) => {
                    let keys = pool[i].clone();
                    let id = id_of(keys.as_slice());
                    match sut.find(id, &keys) {
                        Some(slot) => { sut.replace(slot, keys.clone(), v); }
                        None => { sut.insert(id, keys.clone(), v); }
                    }
                    model.insert(keys, v);
                }
                OpI::Remove(i) => {
                    let keys = &pool[i];
                    if let Some(slot) = sut.find(id_of(keys.as_slice()), keys) {
                        sut.remove(slot);
                    }
                    model.remove(keys);
                }
                _ => {}
            }
            for id in 1..=3u64 {
                let expected = model.keys().any(|k| id_of(k.as_slice()) == id);
                prop_assert_eq!(sut.find_id(id).is_some(), expected);
            }
        }
    }
}
