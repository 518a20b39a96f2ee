//! Public façade (§4.7): the one surface the DAP front-end talks to. Every
//! method here either delegates straight to an engine or does the thin
//! bookkeeping (the "suspended set", callback fan-out) that doesn't belong
//! to any single engine.

use std::sync::{Arc, Mutex};
use std::thread;

use dashmap::DashSet;

use jdwp::{commands::thread_reference, types::ThreadID};

use crate::{
    breakpoints::{BreakpointEngine, BreakpointsChanged, ReplayableCfBreakpointRequest, SetBreakpointResult},
    debug_manager::{DebugFrame, DebugManager, DebugEntity, EvaluationOutcome, StepKind, VariableKind},
    error::DebugCoreError,
    event_pump::EventPump,
    ids::{CanonicalServerPath, DapBreakpointId, DwpThreadId, RawIdePath},
    session::Session,
    stepping::SteppingEngine,
    thread_registry::{NativeThreadHandle, ThreadRegistry},
};

type StepCallback = Box<dyn Fn(DwpThreadId) + Send + Sync>;
type BreakpointCallback = Box<dyn Fn(DwpThreadId, DapBreakpointId) + Send + Sync>;
type BreakpointsChangedCallback = Box<dyn Fn(CanonicalServerPath, Vec<BreakpointsChanged>) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    step_event: Mutex<Option<StepCallback>>,
    breakpoint_event: Mutex<Option<BreakpointCallback>>,
    breakpoints_changed: Mutex<Option<BreakpointsChangedCallback>>,
}

struct Inner<H: NativeThreadHandle> {
    session: Session,
    thread_registry: Arc<ThreadRegistry<H>>,
    breakpoint_engine: Arc<BreakpointEngine<H>>,
    stepping_engine: SteppingEngine<H>,
    debug_manager: Arc<dyn DebugManager<H>>,
    event_pump: EventPump<H>,
    /// Threads currently known to be stopped at a breakpoint or finalized
    /// step, per the "continue" bookkeeping in §4.7. Populated by the
    /// breakpoint/step callbacks wired up in [`Facade::new`], drained by
    /// [`Facade::continue_thread`]/[`Facade::continue_all`].
    suspended: DashSet<DwpThreadId>,
    callbacks: Callbacks,
}

/// The engine described in §4.7. Cheaply cloneable; every clone shares the
/// same suspended-set bookkeeping and the same registered DAP callbacks.
pub struct Facade<H: NativeThreadHandle>(Arc<Inner<H>>);

impl<H: NativeThreadHandle> Clone for Facade<H> {
    fn clone(&self) -> Self {
        Facade(self.0.clone())
    }
}

impl<H: NativeThreadHandle> Facade<H> {
    /// Wires the façade's own bookkeeping into the event pump's three
    /// callback slots. The pump is not started yet — call [`start`](Self::start)
    /// once the DAP front-end has registered whatever callbacks it wants via
    /// [`on_step_event`](Self::on_step_event) and friends.
    pub fn new(
        session: Session,
        thread_registry: Arc<ThreadRegistry<H>>,
        breakpoint_engine: Arc<BreakpointEngine<H>>,
        stepping_engine: SteppingEngine<H>,
        debug_manager: Arc<dyn DebugManager<H>>,
        event_pump: EventPump<H>,
    ) -> Self {
        let inner = Arc::new(Inner {
            session,
            thread_registry,
            breakpoint_engine,
            stepping_engine,
            debug_manager,
            event_pump: event_pump.clone(),
            suspended: DashSet::new(),
            callbacks: Callbacks::default(),
        });

        let for_step = inner.clone();
        event_pump.set_step_callback(move |dwp_thread_id| {
            for_step.suspended.insert(dwp_thread_id);
            if let Some(callback) = for_step.callbacks.step_event.lock().unwrap().as_ref() {
                callback(dwp_thread_id);
            }
        });

        let for_breakpoint = inner.clone();
        event_pump.set_breakpoint_callback(move |dwp_thread_id, dap_breakpoint_id| {
            for_breakpoint.suspended.insert(dwp_thread_id);
            if let Some(callback) = for_breakpoint.callbacks.breakpoint_event.lock().unwrap().as_ref() {
                callback(dwp_thread_id, dap_breakpoint_id);
            }
        });

        let for_changed = inner.clone();
        event_pump.set_breakpoints_changed_callback(move |path, changed| {
            if let Some(callback) = for_changed.callbacks.breakpoints_changed.lock().unwrap().as_ref() {
                callback(path, changed);
            }
        });

        Facade(inner)
    }

    /// Starts the underlying event pump thread (§5).
    pub fn start(&self) -> thread::JoinHandle<()> {
        self.0.event_pump.start()
    }

    pub fn on_step_event(&self, callback: impl Fn(DwpThreadId) + Send + Sync + 'static) {
        *self.0.callbacks.step_event.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn on_breakpoint_event(&self, callback: impl Fn(DwpThreadId, DapBreakpointId) + Send + Sync + 'static) {
        *self.0.callbacks.breakpoint_event.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn on_breakpoints_changed(
        &self,
        callback: impl Fn(CanonicalServerPath, Vec<BreakpointsChanged>) + Send + Sync + 'static,
    ) {
        *self.0.callbacks.breakpoints_changed.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn list_threads(&self) -> Vec<DwpThreadId> {
        self.0.thread_registry.known_thread_ids()
    }

    pub fn get_stack(&self, dwp_thread_id: DwpThreadId) -> Result<Vec<DebugFrame>, DebugCoreError> {
        let native = self.0.thread_registry.require_by_dwp_id(dwp_thread_id)?;
        Ok(self.0.debug_manager.get_cf_stack(&native))
    }

    pub fn get_scopes(&self, frame_id: u64) -> Vec<DebugEntity> {
        self.0.debug_manager.get_scopes_for_frame(frame_id)
    }

    pub fn get_variables(&self, variables_reference: u64, kind: VariableKind) -> Vec<DebugEntity> {
        self.0.debug_manager.get_variables(variables_reference, kind)
    }

    pub fn set_breakpoints(
        &self,
        raw_ide_path: RawIdePath,
        canonical_server_path: CanonicalServerPath,
        lines: &[u32],
        conditions: &[Option<String>],
    ) -> Result<Vec<SetBreakpointResult>, DebugCoreError> {
        self.0
            .breakpoint_engine
            .set_breakpoints(raw_ide_path, canonical_server_path, lines, conditions)
    }

    pub fn clear_breakpoints(&self, path: &CanonicalServerPath) {
        self.0.breakpoint_engine.clear_existing_breakpoints(path)
    }

    pub fn clear_all_breakpoints(&self) -> Result<(), DebugCoreError> {
        self.0.breakpoint_engine.clear_all_breakpoints()
    }

    pub fn list_breakpoints(&self, path: &CanonicalServerPath) -> Vec<ReplayableCfBreakpointRequest> {
        self.0.breakpoint_engine.list_breakpoints(path)
    }

    /// Source paths with at least one replayable breakpoint record, bound or
    /// not (§4.7 "list tracked source paths").
    pub fn tracked_paths(&self) -> Vec<CanonicalServerPath> {
        self.0.breakpoint_engine.tracked_paths()
    }

    /// `continue` for one thread (§4.7). `suspendCount` is sampled exactly
    /// once, before the resume loop, per the mandatory "sample once" rule.
    pub fn continue_thread(&self, dwp_thread_id: DwpThreadId) -> Result<(), DebugCoreError> {
        self.0.suspended.remove(&dwp_thread_id);
        let thread: ThreadID = dwp_thread_id.into();
        let suspend_count = self.0.session.send(thread_reference::SuspendCount::new(thread))?;
        for _ in 0..suspend_count {
            self.0.session.send(thread_reference::Resume::new(thread))?;
        }
        Ok(())
    }

    /// `continue` for every thread currently in the suspended set.
    pub fn continue_all(&self) -> Result<(), DebugCoreError> {
        let ids: Vec<DwpThreadId> = self.0.suspended.iter().map(|e| *e).collect();
        for id in ids {
            self.continue_thread(id)?;
        }
        Ok(())
    }

    pub fn step_in(&self, dwp_thread_id: DwpThreadId) -> Result<(), DebugCoreError> {
        self.step(dwp_thread_id, StepKind::StepIn)
    }

    pub fn step_over(&self, dwp_thread_id: DwpThreadId) -> Result<(), DebugCoreError> {
        self.step(dwp_thread_id, StepKind::StepOver)
    }

    pub fn step_out(&self, dwp_thread_id: DwpThreadId) -> Result<(), DebugCoreError> {
        self.step(dwp_thread_id, StepKind::StepOut)
    }

    fn step(&self, dwp_thread_id: DwpThreadId, kind: StepKind) -> Result<(), DebugCoreError> {
        let native = self.0.thread_registry.require_by_dwp_id(dwp_thread_id)?;
        self.0.suspended.remove(&dwp_thread_id);
        self.0.stepping_engine.arm(&native, kind)
    }

    pub fn evaluate(&self, frame_id: u64, expr: &str) -> EvaluationOutcome {
        self.0.debug_manager.evaluate(frame_id, expr)
    }

    pub fn dump(&self, variables_reference: u64) -> String {
        let threads = self.suspended_native_threads();
        self.0.debug_manager.do_dump(&threads, variables_reference)
    }

    pub fn dump_as_json(&self, variables_reference: u64) -> String {
        let threads = self.suspended_native_threads();
        self.0.debug_manager.do_dump_as_json(&threads, variables_reference)
    }

    pub fn source_path_for_variables_ref(&self, variables_reference: u64) -> Option<String> {
        self.0.debug_manager.get_source_path_for_variables_ref(variables_reference)
    }

    fn suspended_native_threads(&self) -> Vec<Arc<H>> {
        self.0
            .suspended
            .iter()
            .filter_map(|entry| self.0.thread_registry.lookup_by_dwp_id(*entry))
            .collect()
    }
}
