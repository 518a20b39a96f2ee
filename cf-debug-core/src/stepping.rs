//! Stepping engine (§4.5).
//!
//! The target VM's own single-step events degrade execution to interpreted
//! mode, so stepping is implemented on top of the debug manager's own
//! dispatch-edge hooks plus a one-shot JDWP breakpoint used only to pin the
//! thread back down once the debug manager says the step has logically
//! completed.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Sender};
use dashmap::DashMap;

use jdwp::{
    commands::{
        event_request,
        thread_reference::{Frames, FrameLimit, Resume, Suspend},
    },
    enums::{EventKind, SuspendPolicy},
    types::{JdwpId, Location, Modifier, ReferenceTypeID, RequestID, TaggedReferenceTypeID, ThreadID},
};

use crate::{
    debug_manager::{DebugManager, StepKind},
    error::DebugCoreError,
    ids::DwpThreadId,
    session::Session,
    thread_registry::{NativeThreadHandle, ThreadRegistry},
};

/// The invoke-interface instruction the finalizer skips past is fixed size
/// on the target VM's bytecode (§4.5 step 3).
const INVOKE_INTERFACE_SIZE: u64 = 5;

/// Per-thread stepping state (§3 "Stepping state"). `Absent` is represented
/// by the thread having no entry in the map at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Stepping,
    FinalizingViaAwaitedBreakpoint,
}

struct Inner<H: NativeThreadHandle> {
    session: Session,
    thread_registry: Arc<ThreadRegistry<H>>,
    debug_manager: Arc<dyn DebugManager<H>>,
    states: DashMap<DwpThreadId, StepState>,
    /// Maps an armed finalization breakpoint's request id back to the
    /// thread it was armed for, so the event pump can tell it apart from an
    /// ordinary user breakpoint (§4.5).
    finalize_requests: DashMap<RequestID, DwpThreadId>,
    entry_func_name: String,
    finalize_timeout: Duration,
    executor_tx: Sender<Box<dyn FnOnce() + Send>>,
    _executor: thread::JoinHandle<()>,
}

/// The engine described in §4.5. Cheaply cloneable; every clone shares the
/// same state and the same single-threaded finalizer executor (§5).
pub struct SteppingEngine<H: NativeThreadHandle>(Arc<Inner<H>>);

impl<H: NativeThreadHandle> Clone for SteppingEngine<H> {
    fn clone(&self) -> Self {
        SteppingEngine(self.0.clone())
    }
}

impl<H: NativeThreadHandle> SteppingEngine<H> {
    /// Builds the engine and registers its step-completion callback with the
    /// debug manager. The callback is registered exactly once, matching the
    /// "registerCfStepHandler" contract in §6.
    pub fn new(
        session: Session,
        thread_registry: Arc<ThreadRegistry<H>>,
        debug_manager: Arc<dyn DebugManager<H>>,
        entry_func_name: String,
        finalize_timeout: Duration,
    ) -> Self {
        let (tx, rx) = unbounded::<Box<dyn FnOnce() + Send>>();
        let executor = thread::spawn(move || {
            for job in rx {
                job();
            }
        });

        let inner = Arc::new(Inner {
            session,
            thread_registry,
            debug_manager,
            states: DashMap::new(),
            finalize_requests: DashMap::new(),
            entry_func_name,
            finalize_timeout,
            executor_tx: tx,
            _executor: executor,
        });

        let engine = SteppingEngine(inner);
        let callback_engine = engine.clone();
        engine
            .0
            .debug_manager
            .register_cf_step_handler(Box::new(move |native_thread, min_frame_offset| {
                callback_engine.on_step_complete(native_thread, min_frame_offset);
            }));
        engine
    }

    /// Phase 1 — arm (§4.5). Precondition: the thread is currently
    /// suspended (suspendCount > 0).
    pub fn arm(&self, native_thread: &Arc<H>, kind: StepKind) -> Result<(), DebugCoreError> {
        let dwp_thread_ref = self
            .0
            .thread_registry
            .lookup_dwp_ref_by_native(native_thread)
            .ok_or_else(|| DebugCoreError::Invariant("stepping: native thread not registered".into()))?;

        self.0.states.insert(DwpThreadId::from(dwp_thread_ref), StepState::Stepping);
        self.0.debug_manager.register_step_request(native_thread, kind);
        self.0.session.send(Resume::new(dwp_thread_ref))?;
        Ok(())
    }

    /// True while `dwp_thread_ref` has any stepping state armed.
    pub fn is_stepping(&self, dwp_thread_ref: ThreadID) -> bool {
        self.0.states.contains_key(&DwpThreadId::from(dwp_thread_ref))
    }

    pub fn state_of(&self, dwp_thread_ref: ThreadID) -> Option<StepState> {
        self.0.states.get(&DwpThreadId::from(dwp_thread_ref)).map(|e| *e)
    }

    /// A user breakpoint fired on a thread that is still in `Stepping` state
    /// (finalization never arrived, per the §4.5 race). Cancels the step via
    /// the debug manager and drops the state.
    pub fn cancel_on_user_breakpoint(&self, native_thread: &Arc<H>, dwp_thread_ref: ThreadID) {
        if self.0.states.remove(&DwpThreadId::from(dwp_thread_ref)).is_some() {
            self.0.debug_manager.clear_step_request(native_thread);
        }
    }

    /// The event pump uses this to recognize that a breakpoint hit is the
    /// finalization breakpoint rather than a user one (§4.5), and to clear
    /// the bookkeeping either way.
    pub fn take_finalize_request(&self, request_id: RequestID) -> Option<DwpThreadId> {
        self.0.finalize_requests.remove(&request_id).map(|(_, id)| id)
    }

    /// Called under the breakpoint handler once the finalization breakpoint
    /// for `dwp_thread_ref` has actually been hit: clears its stepping state
    /// so a subsequent breakpoint at the same location isn't misattributed.
    pub fn complete(&self, dwp_thread_ref: ThreadID) {
        self.0.states.remove(&DwpThreadId::from(dwp_thread_ref));
    }

    /// Phase 2 — finalize (§4.5). Invoked by the debug manager once the next
    /// dispatch edge matching the armed step kind is reached. Must not run
    /// on the calling thread (it may be the target thread itself); the real
    /// work is handed to the dedicated single-threaded executor while this
    /// call busy-waits on its completion.
    fn on_step_complete(&self, native_thread: Arc<H>, min_frame_offset: u32) {
        let done = Arc::new(AtomicBool::new(false));
        let engine = self.clone();
        let done_for_job = done.clone();

        let submitted = self.0.executor_tx.send(Box::new(move || {
            if let Err(err) = engine.finalize(&native_thread, min_frame_offset) {
                log::warn!("step finalization failed: {err}");
            }
            done_for_job.store(true, Ordering::SeqCst);
        }));

        if submitted.is_err() {
            log::warn!("step finalizer executor is gone, dropping step completion");
            return;
        }

        let deadline = Instant::now() + self.0.finalize_timeout;
        while !done.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::yield_now();
        }
        if !done.load(Ordering::SeqCst) {
            log::warn!("timed out waiting for step finalization to signal completion");
        }
    }

    fn finalize(&self, native_thread: &Arc<H>, min_frame_offset: u32) -> Result<(), DebugCoreError> {
        let dwp_thread_ref = self
            .0
            .thread_registry
            .lookup_dwp_ref_by_native(native_thread)
            .ok_or_else(|| DebugCoreError::Invariant("stepping: native thread not registered".into()))?;

        // Step 1: suspend the thread from off its own calling context.
        self.0.session.send(Suspend::new(dwp_thread_ref))?;

        // Step 2: find the topmost language-level frame.
        let frames = self.0.session.send(Frames::new(
            dwp_thread_ref,
            min_frame_offset,
            FrameLimit::AllRemaining,
        ))?;

        let entry_index = frames
            .iter()
            .position(|(_, location)| {
                self.method_name_matches(location.clone(), &self.0.entry_func_name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                DebugCoreError::Invariant("no frame matched the step-notification entry function".into())
            })?;

        let (_, target_location) = frames.get(entry_index + 1).ok_or_else(|| {
            DebugCoreError::Invariant("step-notification entry frame had no caller frame".into())
        })?;

        // Step 3: arm a one-shot breakpoint just past the invoking instruction.
        let breakpoint_location = Location {
            reference_id: target_location.reference_id,
            method_id: target_location.method_id,
            index: target_location.index + INVOKE_INTERFACE_SIZE,
        };

        let request_id = self.0.session.send(event_request::Set::new(
            EventKind::Breakpoint,
            SuspendPolicy::EventThread,
            vec![
                Modifier::LocationOnly(breakpoint_location),
                Modifier::ThreadOnly(dwp_thread_ref),
                Modifier::Count(1),
            ],
        ))?;

        let dwp_thread_id = DwpThreadId::from(dwp_thread_ref);
        self.0.finalize_requests.insert(request_id, dwp_thread_id);

        // Step 4: transition state.
        self.0.states.insert(dwp_thread_id, StepState::FinalizingViaAwaitedBreakpoint);

        // Step 5: resume.
        self.0.session.send(Resume::new(dwp_thread_ref))?;

        Ok(())
    }

    fn method_name_matches(&self, location: Location, name: &str) -> Result<bool, DebugCoreError> {
        let reference_id = reference_type_id_of(location.reference_id);
        let methods = self
            .0
            .session
            .send(jdwp::commands::reference_type::Methods::new(reference_id))?;
        Ok(methods
            .iter()
            .any(|m| m.method_id == location.method_id && m.name == name))
    }
}

fn reference_type_id_of(tagged: TaggedReferenceTypeID) -> ReferenceTypeID {
    match tagged {
        TaggedReferenceTypeID::Class(id) => ReferenceTypeID::from_raw(id.raw()),
        TaggedReferenceTypeID::Interface(id) => ReferenceTypeID::from_raw(id.raw()),
        TaggedReferenceTypeID::Array(id) => ReferenceTypeID::from_raw(id.raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_state_variants_are_distinct() {
        assert_ne!(StepState::Stepping, StepState::FinalizingViaAwaitedBreakpoint);
    }
}
