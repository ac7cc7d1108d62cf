//! multikey-map: a single-threaded map keyed by ordered tuples of
//! heterogeneous values.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: look up values by composite keys such as `(1, 2, 3)` or
//!   `({foo: "bar"}, "bar")` while keeping the original tuple around for
//!   enumeration.
//! - Layers:
//!   - KeyReducer<K>: pure function from a key tuple `&[K]` to a `u64`
//!     identifier. `HashReducer` (Fx hashing) is the default; any
//!     `Fn(&[K]) -> u64` works, which is how tests force collisions.
//!   - SlotTable<K, V>: structural storage. Entries live in a `SlotMap`
//!     and a `HashTable` indexes their slots by identifier; includes a
//!     debug-only reentrancy guard.
//!   - MultiKeyMap<K, V, R>: public API. Reduces tuples, applies the
//!     collision policy, and delegates storage to SlotTable.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the reentrancy tracker carries a
//!   raw-pointer marker).
//! - Key tuples are non-empty; `set` rejects an empty tuple with
//!   `KeyError::Empty` and lookups report it absent.
//! - O(1) average operations: one reduction and one probe, plus a second
//!   probe when inserting a new entry to detect collisions.
//! - Iteration order is unspecified.
//!
//! Identifiers and collisions
//! - Each entry stores the identifier computed at insertion; the index
//!   only ever uses the stored value, so the reducer is never invoked
//!   while the table rehashes.
//! - Reducers need not be injective. `CollisionPolicy::Chain` (default)
//!   matches entries on identifier and tuple equality so colliding tuples
//!   coexist. `CollisionPolicy::Evict` matches on identifier alone, so a
//!   colliding `set` replaces the earlier entry. Both count collisions
//!   (`collisions()`) and log them through the `log` facade.
//! - `verify()` re-derives every identifier and checks that the index and
//!   storage agree.
//!
//! Reentrancy policy
//! - SlotTable methods run user code only through `K: Eq` while probing.
//!   Debug builds panic if that code re-enters the same table.
//! - Iteration and `for_each` hold no guard, so callbacks may read the
//!   map. Mutation during iteration is ruled out by the borrow checker.

pub mod error;
pub mod key_part;
pub mod multi_key_map;
pub mod reducer;
mod reentrancy;
mod slot_table;
#[cfg(test)]
mod slot_table_proptest;

// Public surface
pub use error::{ConsistencyError, KeyError};
pub use key_part::KeyPart;
pub use multi_key_map::{CollisionPolicy, MultiKeyMap};
pub use reducer::{HashReducer, KeyReducer};
