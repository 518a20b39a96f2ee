//! The "debug manager" (§6): the language-runtime-side collaborator this
//! core calls out to for everything it cannot learn from JDWP alone — stack
//! shape, variable shape, conditional-breakpoint evaluation, stepping
//! edge detection and dump formatting. Owned and implemented elsewhere;
//! this core only consumes it through this trait.

use crate::thread_registry::NativeThreadHandle;

/// One entry of a language-level call stack, as returned by `getCfStack`.
#[derive(Debug, Clone)]
pub struct DebugFrame {
    pub id: u64,
    pub name: String,
    pub source_path: Option<String>,
    pub line: Option<u32>,
}

/// One scope, variable, or nested container in the debug manager's variable
/// tree. `variables_reference` is `0` for leaves, matching the DAP
/// convention of "no children to expand".
#[derive(Debug, Clone)]
pub struct DebugEntity {
    pub name: String,
    pub value: String,
    pub variables_reference: u64,
}

/// Selector for `getVariables`' `kind` parameter (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Any,
    Named,
    Indexed,
}

/// The three step flavors the façade exposes (§4.5, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    StepIn,
    StepOver,
    StepOut,
}

/// Outcome of `evaluate` (§6): either a value good enough to use as a
/// variables-reference root, or a flat textual rendering, or an error
/// message to surface to the DAP client as-is.
#[derive(Debug, Clone)]
pub enum EvaluationOutcome {
    Value(DebugEntity),
    Text(String),
    Error(String),
}

use std::sync::Arc;

/// External collaborator consumed by the breakpoint and stepping engines and
/// by the façade (§6). `H` is the opaque native thread handle type shared
/// with [`crate::thread_registry::ThreadRegistry`].
pub trait DebugManager<H: NativeThreadHandle>: Send + Sync {
    /// Loads the worker bootstrap's designated helper class if needed and
    /// spawns the native helper thread that enters its no-op method (§4.2
    /// steps 1-2). Called exactly once, at startup, before the worker's
    /// breakpoint is armed. Not part of the consumed surface enumerated in
    /// §6 — inferred as the actuator §4.2's bootstrap needs on the runtime
    /// side, since nothing in JDWP itself can start a new native thread.
    fn spawn_worker_thread(&self);

    /// Language-level call stack for a suspended native thread.
    fn get_cf_stack(&self, native_thread: &Arc<H>) -> Vec<DebugFrame>;

    /// Scopes visible at one stack frame.
    fn get_scopes_for_frame(&self, frame_id: u64) -> Vec<DebugEntity>;

    /// Children of one variables-reference, optionally filtered to named or
    /// indexed children only (arrays report both; `Any` returns everything).
    fn get_variables(&self, variables_reference: u64, kind: VariableKind) -> Vec<DebugEntity>;

    /// Resolves the opaque key returned by the worker's thread-lookup method
    /// (§4.2) back into the native thread handle it names. Returns `None` if
    /// the debug manager no longer has a live handle for that key.
    fn resolve_native_thread(&self, lookup_key: i32) -> Option<Arc<H>>;

    /// Registers the single process-wide callback invoked when any armed
    /// step completes. The stepping engine calls this exactly once, at
    /// construction.
    fn register_cf_step_handler(&self, callback: Box<dyn Fn(Arc<H>, u32) + Send + Sync>);

    /// Arms a step of the given kind on the given (already-resumed) thread.
    fn register_step_request(&self, native_thread: &Arc<H>, kind: StepKind);

    /// Cancels a previously armed step, e.g. because a user breakpoint fired
    /// first (§4.5 race).
    fn clear_step_request(&self, native_thread: &Arc<H>);

    /// Evaluates a conditional breakpoint's expression in the context of the
    /// thread currently stopped at it. Called synchronously from the
    /// breakpoint event handler — must not block on the DAP side.
    fn evaluate_as_boolean_for_conditional_breakpoint(
        &self,
        native_thread: &Arc<H>,
        expr: &str,
    ) -> bool;

    /// Renders a variables-reference as a human-readable dump.
    fn do_dump(&self, suspended_threads: &[Arc<H>], variables_reference: u64) -> String;

    /// Renders a variables-reference as a JSON dump.
    fn do_dump_as_json(&self, suspended_threads: &[Arc<H>], variables_reference: u64) -> String;

    /// The canonical server source path backing a variables-reference, if
    /// the debug manager can still resolve one.
    fn get_source_path_for_variables_ref(&self, variables_reference: u64) -> Option<String>;

    /// Evaluates a free-form expression in the context of one stack frame.
    fn evaluate(&self, frame_id: u64, expr: &str) -> EvaluationOutcome;
}
