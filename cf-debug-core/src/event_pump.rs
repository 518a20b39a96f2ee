//! Event pump (§4.6): the dedicated thread that pulls `Composite` event sets
//! off the target VM's event queue and dispatches them to the other engines.
//!
//! Dispatch never blocks on the DAP side and takes no lock broader than a
//! single `dashmap` shard — everything it touches is built to be safe under
//! concurrent DAP request handling (§5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use jdwp::{
    commands::{event::Event, reference_type, thread_reference::Resume},
    enums::ClassStatus,
    types::{JdwpId, ReferenceTypeID, RequestID, TaggedReferenceTypeID, ThreadID},
};

use crate::{
    breakpoints::{BreakpointEngine, BreakpointsChanged},
    class_registry::{self, ClassRegistry, KlassMap},
    debug_manager::DebugManager,
    error::DebugCoreError,
    ids::{CanonicalServerPath, DapBreakpointId, DwpThreadId},
    session::Session,
    stepping::SteppingEngine,
    thread_registry::{NativeThreadHandle, ThreadRegistry},
    worker::WorkerContext,
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
    class_registry: Arc<ClassRegistry>,
    breakpoint_engine: Arc<BreakpointEngine<H>>,
    stepping_engine: SteppingEngine<H>,
    debug_manager: Arc<dyn DebugManager<H>>,
    worker: WorkerContext,
    base_page_class_signature: String,
    callbacks: Callbacks,
    stop: AtomicBool,
    fatal: Mutex<Option<DebugCoreError>>,
}

/// The engine described in §4.6. Cheaply cloneable; every clone shares the
/// same dispatch state and the same pump thread once [`start`](Self::start)
/// has been called.
pub struct EventPump<H: NativeThreadHandle>(Arc<Inner<H>>);

impl<H: NativeThreadHandle> Clone for EventPump<H> {
    fn clone(&self) -> Self {
        EventPump(self.0.clone())
    }
}

impl<H: NativeThreadHandle> EventPump<H> {
    /// Runs the §4.3 class-prepare subscription bootstrap and builds the
    /// pump. Does not start dispatching until [`start`](Self::start) is
    /// called, so the façade has a chance to register its callbacks first.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Session,
        thread_registry: Arc<ThreadRegistry<H>>,
        class_registry: Arc<ClassRegistry>,
        breakpoint_engine: Arc<BreakpointEngine<H>>,
        stepping_engine: SteppingEngine<H>,
        debug_manager: Arc<dyn DebugManager<H>>,
        worker: WorkerContext,
        base_page_class_binary_name: &str,
        bootstrap_timeout: Duration,
    ) -> Result<Self, DebugCoreError> {
        class_registry::bootstrap_class_prepare_subscription(
            &session,
            base_page_class_binary_name,
            bootstrap_timeout,
        )?;

        Ok(EventPump(Arc::new(Inner {
            session,
            thread_registry,
            class_registry,
            breakpoint_engine,
            stepping_engine,
            debug_manager,
            worker,
            base_page_class_signature: format!("L{base_page_class_binary_name};"),
            callbacks: Callbacks::default(),
            stop: AtomicBool::new(false),
            fatal: Mutex::new(None),
        })))
    }

    pub fn set_step_callback(&self, callback: impl Fn(DwpThreadId) + Send + Sync + 'static) {
        *self.0.callbacks.step_event.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn set_breakpoint_callback(&self, callback: impl Fn(DwpThreadId, DapBreakpointId) + Send + Sync + 'static) {
        *self.0.callbacks.breakpoint_event.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn set_breakpoints_changed_callback(
        &self,
        callback: impl Fn(CanonicalServerPath, Vec<BreakpointsChanged>) + Send + Sync + 'static,
    ) {
        *self.0.callbacks.breakpoints_changed.lock().unwrap() = Some(Box::new(callback));
    }

    /// Spawns the dedicated pump thread (§5 "Event pump thread").
    pub fn start(&self) -> thread::JoinHandle<()> {
        let pump = self.clone();
        thread::spawn(move || pump.run())
    }

    /// Requests the pump loop stop after its current blocking receive
    /// returns. Best-effort: a pump blocked in `recv_event` only notices once
    /// another event arrives or the connection is torn down.
    pub fn stop(&self) {
        self.0.stop.store(true, Ordering::SeqCst);
    }

    /// The fatal invariant violation that stopped the pump, if any (§7). The
    /// hosting process is expected to check this and terminate.
    pub fn take_fatal_error(&self) -> Option<DebugCoreError> {
        self.0.fatal.lock().unwrap().take()
    }

    fn run(&self) {
        loop {
            if self.0.stop.load(Ordering::SeqCst) {
                return;
            }

            let Some(composite) = self.0.session.recv_event() else {
                log::info!("event pump: target VM connection closed, stopping");
                return;
            };

            for event in composite.events {
                self.dispatch(event);
                if self.0.fatal.lock().unwrap().is_some() {
                    log::error!("event pump: stopping after a fatal invariant violation");
                    return;
                }
            }

            self.0.thread_registry.sweep_collected();
        }
    }

    fn dispatch(&self, event: Event) {
        match event {
            Event::ThreadStart(_req, thread) => self.handle_thread_start(thread),
            Event::ThreadDeath(_req, thread) => self.handle_thread_death(thread),
            Event::ClassPrepare(_req, thread, type_id, _signature, status) => {
                self.handle_class_prepare(thread, type_id, status)
            }
            Event::ClassUnload(_req, signature) => self.0.class_registry.remove_by_signature(&signature),
            Event::Breakpoint(req, thread, _location) => self.handle_breakpoint(req, thread),
            other => self.mark_fatal(DebugCoreError::Invariant(format!(
                "unexpected event delivered to the pump: {other:?}"
            ))),
        }
    }

    fn handle_thread_start(&self, thread: ThreadID) {
        let dwp_thread_id = DwpThreadId::from(thread);
        match self.0.worker.lookup_thread_key(&self.0.session, thread) {
            Ok(key) => match self.0.debug_manager.resolve_native_thread(key) {
                Some(native) => self.0.thread_registry.register(&native, thread),
                None => log::warn!(
                    "thread-start {dwp_thread_id}: debug manager has no native handle for lookup key {key}"
                ),
            },
            Err(err) => log::warn!("thread-start {dwp_thread_id}: worker thread-key lookup failed: {err}"),
        }
    }

    fn handle_thread_death(&self, thread: ThreadID) {
        self.0.thread_registry.unregister(thread);
        if thread == self.0.worker.thread_ref() {
            self.mark_fatal(DebugCoreError::from(crate::worker::WorkerCollected(thread)));
        }
    }

    fn handle_class_prepare(&self, thread: ThreadID, type_id: TaggedReferenceTypeID, status: ClassStatus) {
        if let Err(err) = self.try_handle_class_prepare(type_id, status) {
            log::warn!("class-prepare handling failed: {err}");
        }
        if let Err(err) = self.0.session.send(Resume::new(thread)) {
            log::warn!("failed to resume thread after class-prepare: {err}");
        }
    }

    fn try_handle_class_prepare(
        &self,
        type_id: TaggedReferenceTypeID,
        status: ClassStatus,
    ) -> Result<(), DebugCoreError> {
        let TaggedReferenceTypeID::Class(class_id) = type_id else {
            return Ok(());
        };

        if !class_registry::is_subclass_of_base(&self.0.session, class_id, &self.0.base_page_class_signature)? {
            return Ok(());
        }

        let reference_id = ReferenceTypeID::from_raw(class_id.raw());
        let source_file = self.0.session.send(reference_type::SourceFile::new(reference_id))?;
        let path = CanonicalServerPath(source_file);

        let Some(mirror) = KlassMap::build(&self.0.session, reference_id, path.clone(), status)? else {
            return Ok(());
        };

        self.0.class_registry.insert(mirror.clone());
        let changed = self.0.breakpoint_engine.rebind_for_new_mirror(&path, &mirror)?;
        if !changed.is_empty() {
            if let Some(callback) = self.0.callbacks.breakpoints_changed.lock().unwrap().as_ref() {
                callback(path, changed);
            }
        }

        Ok(())
    }

    fn handle_breakpoint(&self, request_id: RequestID, thread: ThreadID) {
        let dwp_thread_id = DwpThreadId::from(thread);

        if self.0.stepping_engine.take_finalize_request(request_id).is_some() {
            self.0.stepping_engine.complete(thread);
            if let Some(callback) = self.0.callbacks.step_event.lock().unwrap().as_ref() {
                callback(dwp_thread_id);
            }
            return;
        }

        let Some((path, dap_breakpoint_id)) = self.0.breakpoint_engine.lookup_by_request_id(request_id) else {
            self.mark_fatal(DebugCoreError::Invariant(format!(
                "breakpoint hit for unrecognized request {request_id:?}"
            )));
            return;
        };

        let native = match self.0.thread_registry.require_by_dwp_id(dwp_thread_id) {
            Ok(native) => native,
            Err(err) => {
                self.mark_fatal(err.into());
                return;
            }
        };

        self.0.stepping_engine.cancel_on_user_breakpoint(&native, thread);

        if self.0.breakpoint_engine.evaluate_condition(&path, dap_breakpoint_id, &native) {
            if let Some(callback) = self.0.callbacks.breakpoint_event.lock().unwrap().as_ref() {
                callback(dwp_thread_id, dap_breakpoint_id);
            }
        } else if let Err(err) = self.0.session.send(Resume::new(thread)) {
            log::warn!("failed to resume thread after a false breakpoint condition: {err}");
        }
    }

    fn mark_fatal(&self, err: DebugCoreError) {
        log::error!("{err}");
        *self.0.fatal.lock().unwrap() = Some(err);
    }
}
