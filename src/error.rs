use thiserror::Error;

/// Rejected key tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A key tuple needs at least one component.
    #[error("key tuple is empty; at least one key component is required")]
    Empty,
}

/// Broken internal invariant reported by [`MultiKeyMap::verify`](crate::MultiKeyMap::verify).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// An entry's key tuple no longer reduces to the identifier it is
    /// stored under (the reducer is not pure, or a key was mutated
    /// through interior mutability).
    #[error("entry stored under identifier {stored:#018x} now reduces to {reduced:#018x}")]
    StaleIdentifier { stored: u64, reduced: u64 },
    /// Index and slot storage disagree on the number of entries.
    #[error("index holds {indexed} entries but storage holds {stored}")]
    SizeDrift { indexed: usize, stored: usize },
    /// More than one entry shares an identifier under `CollisionPolicy::Evict`.
    #[error("{count} entries share identifier {id:#018x} under the evicting policy")]
    SharedIdentifier { id: u64, count: usize },
}
