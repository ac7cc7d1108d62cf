//! Debug-only reentrancy tracking for the slot table.
//!
//! Table operations run user code (`K: Eq`) while probing the index. If
//! that code manages to call back into the same table, the index and the
//! slot storage may be observed mid-update. Debug builds record the name
//! of the running operation and panic on nested entry; release builds
//! compile the tracker away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Table methods open a section with
/// `let _s = self.reentrancy.enter("find");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    // Single-threaded: keeps the owning map !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            running: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Open a section for `op`. Debug builds panic if another section on
    /// the same tracker is still open.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.replace(Some(op)) {
                panic!("reentrant call to `{op}` while `{outer}` is still running on this map");
            }
            return Section { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return Section { _z: PhantomData };
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn running(&self) -> Option<&'static str> {
        self.running.get()
    }
}

/// RAII section returned by [`DebugReentrancy::enter`].
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.running.take();
            debug_assert!(prev.is_some());
        }
    }
}
