//! MultiKeyMap: composite-key map layered on SlotTable and a KeyReducer.

use crate::error::{ConsistencyError, KeyError};
use crate::reducer::{HashReducer, KeyReducer};
use crate::slot_table::{Entry, Slot, SlotTable};
use core::fmt;
use core::hash::Hash;
use rustc_hash::FxHashMap;
use slotmap::DefaultKey;

/// How entries whose key tuples reduce to the same identifier are told apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionPolicy {
    /// Match on identifier and element-wise tuple equality. Colliding
    /// tuples are stored side by side.
    #[default]
    Chain,
    /// Match on identifier only. A later `set` with a colliding tuple
    /// replaces the earlier entry, and lookups with either tuple resolve
    /// to whichever was stored last.
    Evict,
}

/// A map keyed by ordered tuples of key components.
///
/// Every lookup reduces the tuple to a `u64` identifier with `R` and probes
/// the table with it. Iteration order is unspecified and may change after
/// any mutation.
///
/// ```
/// use multikey_map::{keys, KeyPart, MultiKeyMap};
///
/// let mut m = MultiKeyMap::new();
/// m.set(keys![1, 2, 3], "a")?
///     .set(keys![KeyPart::map([("foo", "bar")]), "bar"], "b")?;
///
/// assert_eq!(m.get(&keys![1, 2, 3]), Some(&"a"));
/// assert_eq!(m.get(&keys![KeyPart::map([("foo", "bar")]), "bar"]), Some(&"b"));
/// assert_eq!(m.get(&keys![1, 2]), None);
/// assert!(m.delete(&keys![1, 2, 3]));
/// assert_eq!(m.len(), 1);
/// # Ok::<(), multikey_map::KeyError>(())
/// ```
pub struct MultiKeyMap<K, V, R = HashReducer> {
    table: SlotTable<K, V>,
    reducer: R,
    policy: CollisionPolicy,
    collisions: u64,
}

impl<K, V> MultiKeyMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_reducer(HashReducer::new())
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self::with_reducer_and_policy(HashReducer::new(), policy)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: SlotTable::with_capacity(capacity),
            reducer: HashReducer::new(),
            policy: CollisionPolicy::default(),
            collisions: 0,
        }
    }

    /// Build a map by applying [`set`](Self::set) to each `(keys, value)`
    /// pair in order. Later pairs overwrite earlier ones with the same key
    /// tuple. Fails on the first empty tuple.
    pub fn from_entries<I>(entries: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (Vec<K>, V)>,
    {
        Self::from_entries_with_reducer(HashReducer::new(), entries)
    }
}

impl<K, V> Default for MultiKeyMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, R> MultiKeyMap<K, V, R>
where
    K: Eq,
    R: KeyReducer<K>,
{
    pub fn with_reducer(reducer: R) -> Self {
        Self::with_reducer_and_policy(reducer, CollisionPolicy::default())
    }

    pub fn with_reducer_and_policy(reducer: R, policy: CollisionPolicy) -> Self {
        Self {
            table: SlotTable::new(),
            reducer,
            policy,
            collisions: 0,
        }
    }

    pub fn from_entries_with_reducer<I>(reducer: R, entries: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (Vec<K>, V)>,
    {
        let mut map = Self::with_reducer(reducer);
        map.set_all(entries)?;
        Ok(map)
    }

    fn identify(&self, keys: &[K]) -> Option<u64> {
        if keys.is_empty() {
            return None;
        }
        Some(self.reducer.reduce(keys))
    }

    fn locate(&self, keys: &[K]) -> Option<Slot> {
        let id = self.identify(keys)?;
        match self.policy {
            CollisionPolicy::Chain => self.table.find(id, keys),
            CollisionPolicy::Evict => self.table.find_id(id),
        }
    }

    /// Associate `value` with `keys`, returning the value it replaced.
    ///
    /// An existing entry is overwritten in place (both its key tuple and
    /// its value), so `len()` only grows when a new entry is created.
    pub fn insert(&mut self, keys: Vec<K>, value: V) -> Result<Option<V>, KeyError> {
        let id = self.identify(&keys).ok_or(KeyError::Empty)?;
        match self.policy {
            CollisionPolicy::Chain => {
                if let Some(slot) = self.table.find(id, &keys) {
                    return Ok(self.table.replace(slot, keys, value).map(|(_, v)| v));
                }
                if self.table.find_id(id).is_some() {
                    self.collisions += 1;
                    log::debug!(
                        "key tuples collide on identifier {id:#018x}; storing both ({} collisions so far)",
                        self.collisions
                    );
                }
            }
            CollisionPolicy::Evict => {
                if let Some(slot) = self.table.find_id(id) {
                    if self.table.get(slot).is_some_and(|e| e.keys != keys) {
                        self.collisions += 1;
                        log::warn!(
                            "key tuples collide on identifier {id:#018x}; evicting the earlier entry ({} collisions so far)",
                            self.collisions
                        );
                    }
                    return Ok(self.table.replace(slot, keys, value).map(|(_, v)| v));
                }
            }
        }
        self.table.insert(id, keys, value);
        Ok(None)
    }

    /// Associate `value` with `keys` and return the map for chaining.
    pub fn set(&mut self, keys: Vec<K>, value: V) -> Result<&mut Self, KeyError> {
        self.insert(keys, value)?;
        Ok(self)
    }

    /// [`set`](Self::set) every pair in order. Pairs before the first empty
    /// tuple stay applied.
    pub fn set_all<I>(&mut self, entries: I) -> Result<&mut Self, KeyError>
    where
        I: IntoIterator<Item = (Vec<K>, V)>,
    {
        let before = self.len();
        for (keys, value) in entries {
            self.insert(keys, value)?;
        }
        log::trace!("bulk load added {} entries", self.len() - before);
        Ok(self)
    }

    pub fn get(&self, keys: &[K]) -> Option<&V> {
        let slot = self.locate(keys)?;
        self.table.get(slot).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, keys: &[K]) -> Option<&mut V> {
        let slot = self.locate(keys)?;
        self.table.get_mut(slot).map(|e| &mut e.value)
    }

    /// The stored key tuple and value addressed by `keys`. Under
    /// [`CollisionPolicy::Evict`] the stored tuple may differ from `keys`.
    pub fn get_key_value(&self, keys: &[K]) -> Option<(&[K], &V)> {
        let slot = self.locate(keys)?;
        self.table
            .get(slot)
            .map(|e| (e.keys.as_slice(), &e.value))
    }

    pub fn has(&self, keys: &[K]) -> bool {
        self.locate(keys).is_some()
    }

    pub fn contains_key(&self, keys: &[K]) -> bool {
        self.has(keys)
    }

    /// Remove the entry addressed by `keys`. Returns whether one existed.
    pub fn delete(&mut self, keys: &[K]) -> bool {
        self.remove_entry(keys).is_some()
    }

    pub fn remove(&mut self, keys: &[K]) -> Option<V> {
        self.remove_entry(keys).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, keys: &[K]) -> Option<(Vec<K>, V)> {
        let slot = self.locate(keys)?;
        self.table.remove(slot)
    }

    /// Check the structural invariants: every entry's tuple still reduces
    /// to the identifier it is stored under, the index and the storage
    /// agree on the entry count, and under [`CollisionPolicy::Evict`] no
    /// identifier is shared.
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        let (indexed, stored) = (self.table.index_len(), self.table.len());
        if indexed != stored {
            return Err(ConsistencyError::SizeDrift { indexed, stored });
        }
        let mut per_id: FxHashMap<u64, usize> = FxHashMap::default();
        for (_, e) in self.table.iter() {
            let reduced = self.reducer.reduce(e.keys.as_slice());
            if reduced != e.id {
                return Err(ConsistencyError::StaleIdentifier {
                    stored: e.id,
                    reduced,
                });
            }
            *per_id.entry(e.id).or_default() += 1;
        }
        if self.policy == CollisionPolicy::Evict {
            if let Some((&id, &count)) = per_id.iter().find(|&(_, &n)| n > 1) {
                return Err(ConsistencyError::SharedIdentifier { id, count });
            }
        }
        Ok(())
    }
}

impl<K, V, R> MultiKeyMap<K, V, R> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Same as [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    /// Reducer collisions detected by `set`/`insert` since the map was
    /// created or last cleared.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Remove every entry and reset the collision counter.
    pub fn clear(&mut self) {
        log::trace!("clearing {} entries", self.table.len());
        self.table.clear();
        self.collisions = 0;
    }

    /// Keep only the entries for which `f` returns true.
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&[K], &mut V) -> bool,
    {
        self.table.retain(f);
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            it: self.table.iter(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            it: self.table.iter(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            it: self.table.iter_mut(),
        }
    }

    /// Same as [`iter`](Self::iter).
    pub fn entries(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    /// Call `f(value, keys, map)` once per entry. The callback may read the
    /// map it is handed.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&V, &[K], &Self),
    {
        for (_, e) in self.table.iter() {
            f(&e.value, e.keys.as_slice(), self);
        }
    }

    /// Call `f(ctx, value, keys)` once per entry with a caller-supplied
    /// context.
    pub fn for_each_with<C, F>(&self, ctx: &mut C, mut f: F)
    where
        C: ?Sized,
        F: FnMut(&mut C, &V, &[K]),
    {
        for (_, e) in self.table.iter() {
            f(ctx, &e.value, e.keys.as_slice());
        }
    }
}

impl<K, V, R> fmt::Debug for MultiKeyMap<K, V, R>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over stored key tuples.
pub struct Keys<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a [K];
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| e.keys.as_slice())
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over stored values.
pub struct Values<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| &e.value)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over mutable stored values.
pub struct ValuesMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| &mut e.value)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(keys, value)` pairs.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a [K], &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.keys.as_slice(), &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(keys, value)` pairs with mutable values. Key tuples stay
/// immutable: changing them would invalidate their identifiers.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a [K], &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(_, e)| (e.keys.as_slice(), &mut e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owning iterator over `(keys, value)` pairs.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<DefaultKey, Entry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (Vec<K>, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.keys, e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, R> IntoIterator for &'a MultiKeyMap<K, V, R> {
    type Item = (&'a [K], &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, R> IntoIterator for &'a mut MultiKeyMap<K, V, R> {
    type Item = (&'a [K], &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, R> IntoIterator for MultiKeyMap<K, V, R> {
    type Item = (Vec<K>, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_entries(),
        }
    }
}
