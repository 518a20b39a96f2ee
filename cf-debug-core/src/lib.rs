//! Source-level debugger adapter core for CF, attaching to a target managed
//! VM over JDWP and exposing a DAP-adjacent façade (see [`facade::Facade`]).
//!
//! The module layout mirrors the engines described in the design: a thread
//! registry and class registry track target-VM state, a breakpoint engine
//! and stepping engine own their respective request bookkeeping, an event
//! pump dispatches JDWP events to all of the above, and the façade is the
//! single surface a DAP front-end talks to.

mod breakpoints;
mod class_registry;
mod config;
mod debug_manager;
mod error;
mod event_pump;
mod facade;
mod ids;
mod session;
mod stepping;
mod thread_registry;
mod worker;

pub use breakpoints::{
    BindState, BpLineAndId, BreakpointEngine, BreakpointsChanged, ReplayableCfBreakpointRequest, SetBreakpointResult,
};
pub use class_registry::{ClassRegistry, ClassToken, KlassMap};
pub use config::{Config, ConfigError};
pub use debug_manager::{
    DebugEntity, DebugFrame, DebugManager, EvaluationOutcome, StepKind, VariableKind,
};
pub use error::DebugCoreError;
pub use event_pump::EventPump;
pub use facade::Facade;
pub use ids::{CanonicalServerPath, DapBreakpointId, DwpThreadId, RawIdePath};
pub use session::Session;
pub use stepping::{SteppingEngine, StepState};
pub use thread_registry::{NativeThreadHandle, ThreadRegistry, UnknownThread};
pub use worker::{WorkerCollected, WorkerContext};
