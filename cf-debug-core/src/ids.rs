//! Strongly typed identifiers so that a server path, an IDE path and a raw
//! integer id can never be silently swapped for one another at a call site.

use std::fmt;

use jdwp::types::ThreadID;

/// The JDWP-level identity of a thread, as seen on the wire.
///
/// Distinct from [`ThreadID`] itself so that the rest of the engine can key
/// concurrent maps on something `Copy + Eq + Hash` without reaching into
/// `jdwp` internals at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DwpThreadId(pub(crate) ThreadID);

impl From<ThreadID> for DwpThreadId {
    fn from(id: ThreadID) -> Self {
        DwpThreadId(id)
    }
}

impl From<DwpThreadId> for ThreadID {
    fn from(id: DwpThreadId) -> Self {
        id.0
    }
}

impl fmt::Display for DwpThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Id handed out to the DAP front-end for one breakpoint record.
///
/// Stable across rebinds: see the invariant on
/// [`ReplayableCfBreakpointRequest`](crate::breakpoints::ReplayableCfBreakpointRequest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DapBreakpointId(pub u64);

impl fmt::Display for DapBreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path as registered canonically in the class registry — what `KlassMap`s
/// are keyed by. Never to be confused with [`RawIdePath`], which is whatever
/// string the IDE happened to send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalServerPath(pub String);

impl fmt::Display for CanonicalServerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The path string exactly as sent by the IDE, kept around only to hand back
/// in breakpoint results — never used as a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawIdePath(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dap_breakpoint_ids_are_ordered_by_value() {
        assert!(DapBreakpointId(1) < DapBreakpointId(2));
    }

    #[test]
    fn canonical_and_raw_paths_are_distinct_types() {
        let canonical = CanonicalServerPath("/srv/a.cf".into());
        let raw = RawIdePath("/home/user/a.cf".into());
        assert_ne!(canonical.0, raw.0);
    }
}
