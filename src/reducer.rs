//! Key reducers: collapse a key tuple into one `u64` identifier.

use core::hash::{BuildHasher, Hash};
use rustc_hash::FxBuildHasher;

/// Reduces an ordered key tuple to a single identifier.
///
/// Implementations must be pure: the same logical tuple always yields the
/// same identifier, and the order of components matters. They need not be
/// injective; [`MultiKeyMap`](crate::MultiKeyMap) detects collisions and
/// resolves them according to its [`CollisionPolicy`](crate::CollisionPolicy).
///
/// Any `Fn(&[K]) -> u64` is a reducer:
///
/// ```
/// use multikey_map::{keys, CollisionPolicy, KeyPart, MultiKeyMap};
///
/// let by_len = |k: &[KeyPart]| k.len() as u64;
/// let mut m = MultiKeyMap::with_reducer(by_len);
/// m.set(keys![1, 2], "a").unwrap();
/// m.set(keys![3, 4], "b").unwrap();
/// assert_eq!(m.len(), 2);
/// assert_eq!(m.collisions(), 1);
/// assert_eq!(m.policy(), CollisionPolicy::Chain);
/// ```
pub trait KeyReducer<K> {
    fn reduce(&self, keys: &[K]) -> u64;
}

impl<K, F> KeyReducer<K> for F
where
    F: Fn(&[K]) -> u64,
{
    #[inline]
    fn reduce(&self, keys: &[K]) -> u64 {
        self(keys)
    }
}

/// Default reducer: hashes the whole tuple (length prefix, then each
/// component in order) with a `BuildHasher`.
///
/// The default `FxBuildHasher` is unseeded, so identifiers are stable
/// across maps, runs and processes. Swap in a seeded hasher with
/// [`HashReducer::with_hasher`] when keys come from untrusted input.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashReducer<S = FxBuildHasher> {
    build: S,
}

impl HashReducer {
    pub const fn new() -> Self {
        Self {
            build: FxBuildHasher,
        }
    }
}

impl<S> HashReducer<S> {
    pub const fn with_hasher(build: S) -> Self {
        Self { build }
    }

    pub fn hasher(&self) -> &S {
        &self.build
    }
}

impl<K, S> KeyReducer<K> for HashReducer<S>
where
    K: Hash,
    S: BuildHasher,
{
    #[inline]
    fn reduce(&self, keys: &[K]) -> u64 {
        self.build.hash_one(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keys, KeyPart};
    use std::collections::hash_map::RandomState;

    #[test]
    fn same_tuple_same_identifier() {
        let r = HashReducer::new();
        let a = keys![1, 2, 3];
        let b = keys![1, 2, 3];
        assert_eq!(r.reduce(&a), r.reduce(&b));
        assert_eq!(r.reduce(&a), r.reduce(&a));
    }

    #[test]
    fn identifiers_are_stable_across_instances() {
        let k = keys!["foo", KeyPart::map([("foo", "bar")])];
        let defaulted: HashReducer = HashReducer::default();
        assert_eq!(HashReducer::new().reduce(&k), defaulted.reduce(&k));
        assert_eq!(
            HashReducer::<FxBuildHasher>::default().reduce(&k),
            HashReducer::with_hasher(FxBuildHasher).reduce(&k)
        );
    }

    #[test]
    fn order_and_length_matter() {
        let r = HashReducer::new();
        assert_ne!(r.reduce(&keys![1, 2]), r.reduce(&keys![2, 1]));
        assert_ne!(r.reduce(&keys![1]), r.reduce(&keys![1, 1]));
        // Nesting changes the tuple shape, so it changes the identifier.
        assert_ne!(
            r.reduce(&keys![1, 2]),
            r.reduce(&keys![KeyPart::list([1, 2])])
        );
    }

    #[test]
    fn seeded_hasher_is_consistent_within_one_reducer() {
        let r = HashReducer::with_hasher(RandomState::new());
        let k = vec!["a".to_string(), "b".to_string()];
        assert_eq!(r.reduce(&k), r.reduce(&k.clone()));
    }

    #[test]
    fn closures_are_reducers() {
        let constant = |_: &[i32]| 7u64;
        assert_eq!(constant.reduce(&[1, 2][..]), 7);
        assert_eq!(KeyReducer::<i32>::reduce(&constant, &[3]), 7);
    }
}
