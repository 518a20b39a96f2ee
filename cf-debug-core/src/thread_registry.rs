//! Bidirectional thread registry (§4.1).
//!
//! Keeps `dwpThreadId -> weak native handle` and `native handle -> dwpThreadRef`
//! so that a DAP-side thread id can be turned back into whatever the debug
//! manager needs to walk stacks and evaluate expressions, and vice versa.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use jdwp::types::ThreadID;

use crate::ids::DwpThreadId;

/// Opaque handle to whatever the debug manager considers "the native thread
/// object" — this core never looks inside it, only passes it around.
pub trait NativeThreadHandle: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> NativeThreadHandle for T {}

/// The registry described in §4.1.
///
/// `register`/`unregister`/`lookup_by_dwp_id` never block on the target VM;
/// the only blocking they can do is a `dashmap` shard lock, held for the
/// duration of a single map operation.
pub struct ThreadRegistry<H: NativeThreadHandle> {
    by_dwp_id: DashMap<DwpThreadId, Weak<H>>,
    by_native: DashMap<usize, ThreadID>,
}

/// A lookup against the registry came back empty: the DAP side referenced a
/// thread the core no longer tracks. Per §7 this is a non-recoverable
/// protocol error from the registry's point of view — callers decide whether
/// that means aborting the whole process or just failing one request.
#[derive(Debug, thiserror::Error)]
#[error("no live thread registered for {0}")]
pub struct UnknownThread(pub DwpThreadId);

impl<H: NativeThreadHandle> Default for ThreadRegistry<H> {
    fn default() -> Self {
        Self {
            by_dwp_id: DashMap::new(),
            by_native: DashMap::new(),
        }
    }
}

impl<H: NativeThreadHandle> ThreadRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly observed thread-start. `native` is held weakly:
    /// once every strong `Arc` to it is dropped the `dwpThreadId` entry is
    /// pruned lazily, on the next operation that happens to touch it.
    pub fn register(&self, native: &Arc<H>, dwp_ref: ThreadID) {
        let dwp_id = DwpThreadId::from(dwp_ref);
        self.by_dwp_id.insert(dwp_id, Arc::downgrade(native));
        self.by_native.insert(Arc::as_ptr(native) as usize, dwp_ref);
        log::debug!("thread registry: registered {dwp_id}");
    }

    /// Removes a thread entirely, e.g. on a thread-death event.
    pub fn unregister(&self, dwp_ref: ThreadID) {
        let dwp_id = DwpThreadId::from(dwp_ref);
        if let Some((_, weak)) = self.by_dwp_id.remove(&dwp_id) {
            if let Some(native) = weak.upgrade() {
                self.by_native.remove(&(Arc::as_ptr(&native) as usize));
            }
        }
        log::debug!("thread registry: unregistered {dwp_id}");
    }

    /// Returns the live native handle for a dwp thread id, or `None` if the
    /// thread was never registered or its native handle was already collected.
    pub fn lookup_by_dwp_id(&self, dwp_id: DwpThreadId) -> Option<Arc<H>> {
        let weak = self.by_dwp_id.get(&dwp_id)?;
        match weak.upgrade() {
            Some(native) => Some(native),
            None => {
                // Native side was collected; prune eagerly since we're here anyway.
                drop(weak);
                self.by_dwp_id.remove(&dwp_id);
                None
            }
        }
    }

    /// Same as [`lookup_by_dwp_id`](Self::lookup_by_dwp_id) but returns the
    /// fatal-protocol-error variant callers in §7's "invariant violation" row
    /// are expected to propagate.
    pub fn require_by_dwp_id(&self, dwp_id: DwpThreadId) -> Result<Arc<H>, UnknownThread> {
        self.lookup_by_dwp_id(dwp_id).ok_or(UnknownThread(dwp_id))
    }

    pub fn lookup_dwp_ref_by_native(&self, native: &Arc<H>) -> Option<ThreadID> {
        self.by_native
            .get(&(Arc::as_ptr(native) as usize))
            .map(|r| *r)
    }

    /// Sweeps entries whose weak native side has been collected. There is no
    /// finalizer/cleaner hook in Rust to drive this automatically (§9), so
    /// callers invoke this periodically (e.g. from the event pump's idle loop).
    pub fn sweep_collected(&self) {
        self.by_dwp_id.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Every dwp thread id currently registered, live or not yet swept.
    pub fn known_thread_ids(&self) -> Vec<DwpThreadId> {
        self.by_dwp_id.iter().map(|e| *e.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_dwp_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_dwp_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_id(raw: u64) -> ThreadID {
        // ThreadID has no public constructor from a raw wire id outside the
        // codec path in this crate, so tests go through `jdwp::types::JdwpId`.
        use jdwp::types::JdwpId;
        ThreadID::from_raw(raw)
    }

    #[test]
    fn register_then_lookup_round_trips() {
        let registry: ThreadRegistry<()> = ThreadRegistry::new();
        let native = Arc::new(());
        let dwp_ref = thread_id(1);

        registry.register(&native, dwp_ref);

        let found = registry.require_by_dwp_id(DwpThreadId::from(dwp_ref));
        assert!(found.is_ok());
        assert_eq!(registry.lookup_dwp_ref_by_native(&native), Some(dwp_ref));
    }

    #[test]
    fn unregister_removes_both_sides() {
        let registry: ThreadRegistry<()> = ThreadRegistry::new();
        let native = Arc::new(());
        let dwp_ref = thread_id(2);

        registry.register(&native, dwp_ref);
        registry.unregister(dwp_ref);

        assert!(registry.lookup_by_dwp_id(DwpThreadId::from(dwp_ref)).is_none());
        assert_eq!(registry.lookup_dwp_ref_by_native(&native), None);
    }

    #[test]
    fn collected_native_handle_is_pruned_on_lookup() {
        let registry: ThreadRegistry<()> = ThreadRegistry::new();
        let dwp_ref = thread_id(3);
        {
            let native = Arc::new(());
            registry.register(&native, dwp_ref);
        } // native dropped, only a Weak remains

        assert!(registry.lookup_by_dwp_id(DwpThreadId::from(dwp_ref)).is_none());
        assert!(registry.require_by_dwp_id(DwpThreadId::from(dwp_ref)).is_err());
    }

    #[test]
    fn sweep_collected_clears_dead_entries() {
        let registry: ThreadRegistry<()> = ThreadRegistry::new();
        let dwp_ref = thread_id(4);
        {
            let native = Arc::new(());
            registry.register(&native, dwp_ref);
        }
        registry.sweep_collected();
        assert!(registry.is_empty());
    }
}
