//! Worker bootstrap (§4.2).
//!
//! JDWP has no command that turns a `dwpThreadRef` back into whatever native
//! object the debug manager considers "the thread" — the wire protocol only
//! ever hands out its own opaque IDs. This module buys that inverse mapping
//! once, at startup, by parking a helper thread at a known breakpoint and
//! using JDWP's synchronous `invokeMethod` against it afterward.

use std::time::{Duration, Instant};

use jdwp::{
    commands::{class_type, event::Event, event_request, reference_type, virtual_machine},
    enums::{EventKind, InvokeOptions, SuspendPolicy},
    types::{
        ClassID, JdwpId, Location, MethodID, Modifier, ObjectID, RequestID, TaggedReferenceTypeID,
        ThreadID, Value,
    },
};

use crate::{debug_manager::DebugManager, error::DebugCoreError, session::Session, thread_registry::NativeThreadHandle};

/// Established exactly once at attach (§3 "Worker context"). `thread_ref`
/// remains suspended at its breakpoint for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct WorkerContext {
    class_id: ClassID,
    thread_ref: ThreadID,
    lookup_method_id: MethodID,
}

/// The worker's dwpThreadRef was collected — a fatal invariant violation
/// (§4.2 "Failure"), since every subsequent thread-lookup call depends on it.
#[derive(Debug, thiserror::Error)]
#[error("worker bootstrap thread {0:?} is no longer alive")]
pub struct WorkerCollected(pub ThreadID);

impl WorkerContext {
    /// Runs the bootstrap dance described in §4.2:
    ///
    /// 1. ensure the helper class is loaded (waiting on a one-shot class
    ///    prepare if it isn't yet),
    /// 2. ask the debug manager to spawn the helper thread,
    /// 3. arm a breakpoint at code index 0 of its no-op method with
    ///    suspend policy event-thread,
    /// 4. busy-wait (bounded by `timeout`) for that breakpoint to be hit.
    pub fn bootstrap<H: NativeThreadHandle>(
        session: &Session,
        debug_manager: &dyn DebugManager<H>,
        class_binary_name: &str,
        noop_method_name: &str,
        lookup_method_name: &str,
        timeout: Duration,
    ) -> Result<WorkerContext, DebugCoreError> {
        let signature = format!("L{class_binary_name};");
        let deadline = Instant::now() + timeout;

        let already_loaded = Self::find_loaded_class(session, &signature)?;

        let pending_prepare = match already_loaded {
            Some(_) => None,
            None => {
                let dotted = class_binary_name.replace('/', ".");
                Some(session.send(event_request::Set::new(
                    EventKind::ClassPrepare,
                    SuspendPolicy::EventThread,
                    vec![Modifier::ClassMatch(dotted)],
                ))?)
            }
        };

        debug_manager.spawn_worker_thread();

        let class_id = match already_loaded {
            Some(id) => id,
            None => {
                let request_id = pending_prepare.expect("prepare request set above");
                Self::await_class_prepare(session, request_id, deadline)?
            }
        };

        let (noop_method_id, lookup_method_id) =
            Self::resolve_methods(session, class_id, noop_method_name, lookup_method_name)?;

        let location = Location {
            reference_id: TaggedReferenceTypeID::Class(class_id),
            method_id: noop_method_id,
            index: 0,
        };

        let breakpoint_request = session.send(event_request::Set::new(
            EventKind::Breakpoint,
            SuspendPolicy::EventThread,
            vec![Modifier::LocationOnly(location)],
        ))?;

        let thread_ref = Self::await_breakpoint_hit(session, breakpoint_request, deadline)?;

        Ok(WorkerContext {
            class_id,
            thread_ref,
            lookup_method_id,
        })
    }

    fn find_loaded_class(session: &Session, signature: &str) -> Result<Option<ClassID>, DebugCoreError> {
        let classes = session.send(virtual_machine::ClassesBySignature::new(signature))?;
        Ok(classes.into_iter().find_map(|(type_id, _status)| match type_id {
            TaggedReferenceTypeID::Class(id) => Some(id),
            _ => None,
        }))
    }

    fn resolve_methods(
        session: &Session,
        class_id: ClassID,
        noop_name: &str,
        lookup_name: &str,
    ) -> Result<(MethodID, MethodID), DebugCoreError> {
        let reference_id = ReferenceIdOf::class(class_id);
        let methods = session.send(reference_type::Methods::new(reference_id))?;

        let noop = methods
            .iter()
            .find(|m| m.name == noop_name)
            .map(|m| m.method_id)
            .ok_or_else(|| {
                DebugCoreError::Invariant(format!(
                    "worker helper class has no method named {noop_name}"
                ))
            })?;
        let lookup = methods
            .iter()
            .find(|m| m.name == lookup_name)
            .map(|m| m.method_id)
            .ok_or_else(|| {
                DebugCoreError::Invariant(format!(
                    "worker helper class has no method named {lookup_name}"
                ))
            })?;

        Ok((noop, lookup))
    }

    fn await_class_prepare(
        session: &Session,
        request_id: RequestID,
        deadline: Instant,
    ) -> Result<ClassID, DebugCoreError> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DebugCoreError::Invariant(
                    "timed out waiting for worker helper class to prepare".into(),
                ));
            }
            let Some(composite) = session.recv_event_timeout(remaining) else {
                return Err(DebugCoreError::Invariant(
                    "timed out waiting for worker helper class to prepare".into(),
                ));
            };

            for event in composite.events {
                if let Event::ClassPrepare(req, thread, type_id, _signature, _status) = event {
                    if req == request_id {
                        session.send(event_request::Clear::new(EventKind::ClassPrepare, req))?;
                        session.send(jdwp::commands::thread_reference::Resume::new(thread))?;
                        let TaggedReferenceTypeID::Class(class_id) = type_id else {
                            return Err(DebugCoreError::Invariant(
                                "worker helper class prepared as a non-class reference type".into(),
                            ));
                        };
                        return Ok(class_id);
                    }
                }
            }
        }
    }

    fn await_breakpoint_hit(
        session: &Session,
        request_id: RequestID,
        deadline: Instant,
    ) -> Result<ThreadID, DebugCoreError> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DebugCoreError::Invariant(
                    "timed out waiting for worker helper thread to hit its bootstrap breakpoint".into(),
                ));
            }
            let Some(composite) = session.recv_event_timeout(remaining) else {
                return Err(DebugCoreError::Invariant(
                    "timed out waiting for worker helper thread to hit its bootstrap breakpoint".into(),
                ));
            };

            for event in composite.events {
                if let Event::Breakpoint(req, thread, _location) = event {
                    if req == request_id {
                        return Ok(thread);
                    }
                }
            }
        }
    }

    /// Translates a dwpThreadRef into whatever key the debug manager uses to
    /// retrieve the matching native thread handle, via a synchronous
    /// single-threaded `invokeMethod` against the worker thread (§4.2).
    ///
    /// Returns [`WorkerCollected`] if the worker's own thread has died —
    /// callers should treat that as fatal per §4.2 "Failure".
    pub fn lookup_thread_key(&self, session: &Session, dwp_thread_ref: ThreadID) -> Result<i32, DebugCoreError> {
        let argument = Value::Object(ObjectID::from_raw(dwp_thread_ref.raw()));

        let reply = session.send(class_type::InvokeMethod::new(
            self.class_id,
            self.thread_ref,
            self.lookup_method_id,
            vec![argument],
            InvokeOptions::SINGLE_THREADED,
        ));

        match reply {
            Ok(jdwp::types::InvokeMethodReply::Value(Value::Int(key))) => Ok(key),
            Ok(jdwp::types::InvokeMethodReply::Value(other)) => Err(DebugCoreError::Invariant(format!(
                "worker thread-lookup method returned an unexpected value: {other:?}"
            ))),
            Ok(jdwp::types::InvokeMethodReply::Exception(_)) => Err(DebugCoreError::Invariant(
                "worker thread-lookup method threw".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub fn thread_ref(&self) -> ThreadID {
        self.thread_ref
    }
}

/// `reference_type::Methods` wants a `ReferenceTypeID`, but we only have a
/// `ClassID` by the time we've resolved the helper class — both are the same
/// wire-level id, just tagged differently on the Rust side.
struct ReferenceIdOf;

impl ReferenceIdOf {
    fn class(class_id: ClassID) -> jdwp::types::ReferenceTypeID {
        jdwp::types::ReferenceTypeID::from_raw(class_id.raw())
    }
}
