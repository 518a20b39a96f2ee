use jdwp::client::ClientError;

use crate::ids::{CanonicalServerPath, DapBreakpointId, DwpThreadId};

/// Errors surfaced to the DAP façade (§7).
///
/// Every "invariant violation" row of §7's table is fatal by policy: the
/// hosting process is expected to log it and terminate rather than try to
/// keep serving requests from a debugger that no longer matches target-VM
/// reality. Every other variant is routine and safe to return to one caller.
#[derive(Debug, thiserror::Error)]
pub enum DebugCoreError {
    #[error("jdwp transport error: {0}")]
    Transport(#[from] ClientError),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("thread {0} is not known to the core")]
    UnknownThread(DwpThreadId),

    #[error("no replayable breakpoint record {0} for {1}")]
    UnknownBreakpoint(DapBreakpointId, CanonicalServerPath),

    #[error("debug manager evaluation failed: {0}")]
    Evaluation(String),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    WorkerCollected(#[from] crate::worker::WorkerCollected),
}

impl From<crate::thread_registry::UnknownThread> for DebugCoreError {
    fn from(err: crate::thread_registry::UnknownThread) -> Self {
        DebugCoreError::UnknownThread(err.0)
    }
}

impl DebugCoreError {
    /// True for the "invariant violation" class of §7: callers that receive
    /// one of these are expected to log and terminate the process rather than
    /// recover.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DebugCoreError::Invariant(_)
                | DebugCoreError::UnknownThread(_)
                | DebugCoreError::WorkerCollected(_)
        )
    }
}
