//! SlotTable: identifier-indexed entry storage with a debug reentrancy guard.
//!
//! Entries live in a `SlotMap`; a `HashTable` indexes their slot keys by
//! the identifier the reducer produced at insertion. The table never sees
//! the reducer: probing and rehashing use the stored identifier only.
//! Several entries may share one identifier; callers decide how to match
//! them (identifier alone, or identifier plus tuple equality).

use crate::reentrancy::DebugReentrancy;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};

/// Stable address of one entry in a [`SlotTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Slot(DefaultKey);

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) id: u64,
    pub(crate) keys: Vec<K>,
    pub(crate) value: V,
}

pub(crate) struct SlotTable<K, V> {
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    reentrancy: DebugReentrancy,
}

impl<K, V> SlotTable<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Any entry stored under `id`, regardless of its key tuple.
    pub(crate) fn find_id(&self, id: u64) -> Option<Slot> {
        let _s = self.reentrancy.enter("find_id");
        self.index
            .find(id, |&k| self.slots.get(k).is_some_and(|e| e.id == id))
            .map(|&k| Slot(k))
    }

    /// Insert a new entry without checking for an existing one. Callers
    /// probe first with `find`/`find_id`.
    pub(crate) fn insert(&mut self, id: u64, keys: Vec<K>, value: V) -> Slot {
        let _s = self.reentrancy.enter("insert");
        let k = self.slots.insert(Entry { id, keys, value });
        let slots = &self.slots;
        self.index
            .insert_unique(id, k, |&kk| slots.get(kk).map(|e| e.id).unwrap_or(0));
        Slot(k)
    }

    /// Overwrite the key tuple and value of a live entry in place, keeping
    /// its identifier and slot. Returns the previous pair.
    pub(crate) fn replace(&mut self, slot: Slot, keys: Vec<K>, value: V) -> Option<(Vec<K>, V)> {
        let _s = self.reentrancy.enter("replace");
        let e = self.slots.get_mut(slot.0)?;
        let old_keys = core::mem::replace(&mut e.keys, keys);
        let old_value = core::mem::replace(&mut e.value, value);
        Some((old_keys, old_value))
    }

    pub(crate) fn remove(&mut self, slot: Slot) -> Option<(Vec<K>, V)> {
        let _s = self.reentrancy.enter("remove");
        let k = slot.0;

        let entry = self.slots.remove(k)?;

        // Unlink from index via the stored identifier.
        match self.index.find_entry(entry.id, |&kk| kk == k) {
            Ok(occupied) => {
                occupied.remove();
            }
            Err(_) => debug_assert!(false, "slot {k:?} missing from index"),
        }

        Some((entry.keys, entry.value))
    }

    pub(crate) fn get(&self, slot: Slot) -> Option<&Entry<K, V>> {
        let _s = self.reentrancy.enter("get");
        self.slots.get(slot.0)
    }

    pub(crate) fn get_mut(&mut self, slot: Slot) -> Option<&mut Entry<K, V>> {
        let _s = self.reentrancy.enter("get_mut");
        self.slots.get_mut(slot.0)
    }

    pub(crate) fn clear(&mut self) {
        let _s = self.reentrancy.enter("clear");
        self.index.clear();
        self.slots.clear();
    }

    /// Keep only entries for which `f` returns true.
    pub(crate) fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&[K], &mut V) -> bool,
    {
        // `f` sees every entry before any of them is unlinked.
        let mut dropped = Vec::new();
        for (k, e) in self.slots.iter_mut() {
            if !f(e.keys.as_slice(), &mut e.value) {
                dropped.push(k);
            }
        }
        for k in dropped {
            let removed = self.remove(Slot(k));
            debug_assert!(removed.is_some(), "slot {k:?} vanished during retain");
        }
    }

    pub(crate) fn iter(&self) -> slotmap::basic::Iter<'_, DefaultKey, Entry<K, V>> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> slotmap::basic::IterMut<'_, DefaultKey, Entry<K, V>> {
        self.slots.iter_mut()
    }

    pub(crate) fn into_entries(self) -> slotmap::basic::IntoIter<DefaultKey, Entry<K, V>> {
        self.slots.into_iter()
    }
}

impl<K: Eq, V> SlotTable<K, V> {
    /// The entry stored under `id` whose key tuple equals `keys`.
    pub(crate) fn find(&self, id: u64, keys: &[K]) -> Option<Slot> {
        let _s = self.reentrancy.enter("find");
        self.index
            .find(id, |&k| {
                self.slots
                    .get(k)
                    .is_some_and(|e| e.id == id && e.keys.as_slice() == keys)
            })
            .map(|&k| Slot(k))
    }
}
