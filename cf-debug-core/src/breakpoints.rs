//! Breakpoint engine (§4.4): owns replayable breakpoint records, binds them
//! against whatever class mirrors are currently known, rebinds them as new
//! mirrors appear, and evaluates conditional expressions on hit.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;

use jdwp::{
    client::ClientError,
    commands::event_request,
    enums::{ErrorCode, EventKind, SuspendPolicy},
    types::{Modifier, RequestID},
};

use crate::{
    class_registry::{ClassRegistry, ClassToken, KlassMap},
    debug_manager::DebugManager,
    error::DebugCoreError,
    ids::{CanonicalServerPath, DapBreakpointId, RawIdePath},
    session::Session,
    thread_registry::NativeThreadHandle,
};

/// A line within a path together with the DAP id that has been (or will be)
/// assigned to it — an id is reused across rebinds of the same (path, line)
/// pair (§3 invariant).
#[derive(Debug, Clone, Copy)]
pub struct BpLineAndId {
    pub line: u32,
    pub id: DapBreakpointId,
}

/// One user-set breakpoint, replayable across class (re)loads (§3).
///
/// Equality ignores the installed JDWP handle, matching the invariant that
/// two records naming the same source position are the same breakpoint
/// regardless of whether either happens to be bound right now.
#[derive(Debug, Clone)]
pub struct ReplayableCfBreakpointRequest {
    pub raw_ide_path: RawIdePath,
    pub canonical_server_path: CanonicalServerPath,
    pub line: u32,
    pub dap_breakpoint_id: DapBreakpointId,
    pub condition: Option<String>,
    handle: Option<RequestID>,
}

impl PartialEq for ReplayableCfBreakpointRequest {
    fn eq(&self, other: &Self) -> bool {
        self.raw_ide_path == other.raw_ide_path
            && self.canonical_server_path == other.canonical_server_path
            && self.line == other.line
            && self.dap_breakpoint_id == other.dap_breakpoint_id
            && self.condition == other.condition
    }
}

impl ReplayableCfBreakpointRequest {
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }
}

/// Result of setting one requested line (§4.4 "Setting breakpoints").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Bound,
    Unbound,
}

#[derive(Debug, Clone, Copy)]
pub struct SetBreakpointResult {
    pub dap_breakpoint_id: DapBreakpointId,
    pub line: u32,
    pub state: BindState,
}

/// A record whose bound-state changed as a side effect of a class-prepare
/// driven rebind — the payload of a `BreakpointsChanged` callback (§4.4,
/// §4.7).
#[derive(Debug, Clone, Copy)]
pub struct BreakpointsChanged {
    pub dap_breakpoint_id: DapBreakpointId,
    pub line: u32,
    pub state: BindState,
}

struct PathRecords {
    records: Vec<ReplayableCfBreakpointRequest>,
}

/// Owns every replayable breakpoint record and every installed JDWP
/// breakpoint request, keyed by canonical source path (§4.4).
pub struct BreakpointEngine<H: NativeThreadHandle> {
    session: Session,
    class_registry: Arc<ClassRegistry>,
    debug_manager: Arc<dyn DebugManager<H>>,
    by_path: DashMap<CanonicalServerPath, PathRecords>,
    /// Lets the event pump turn a JDWP breakpoint hit straight back into
    /// (path, dapBreakpointId) without scanning every record.
    by_request_id: DashMap<RequestID, (CanonicalServerPath, DapBreakpointId)>,
    next_id: AtomicU64,
}

impl<H: NativeThreadHandle> BreakpointEngine<H> {
    pub fn new(
        session: Session,
        class_registry: Arc<ClassRegistry>,
        debug_manager: Arc<dyn DebugManager<H>>,
    ) -> Self {
        Self {
            session,
            class_registry,
            debug_manager,
            by_path: DashMap::new(),
            by_request_id: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> DapBreakpointId {
        DapBreakpointId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Sets breakpoints at `lines` for `path`, replacing whatever set of
    /// breakpoints currently exists for that path (§4.4 "Setting
    /// breakpoints"). Returns one result per input line, in the same order.
    pub fn set_breakpoints(
        &self,
        raw_ide_path: RawIdePath,
        canonical_server_path: CanonicalServerPath,
        lines: &[u32],
        conditions: &[Option<String>],
    ) -> Result<Vec<SetBreakpointResult>, DebugCoreError> {
        let existing_ids = self.existing_ids_by_line(&canonical_server_path);

        let bp_line_and_ids: Vec<BpLineAndId> = lines
            .iter()
            .map(|&line| BpLineAndId {
                line,
                id: existing_ids
                    .get(&line)
                    .copied()
                    .unwrap_or_else(|| self.allocate_id()),
            })
            .collect();

        self.clear_existing_breakpoints(&canonical_server_path);

        let mirrors = self.class_registry.mirrors_for(&canonical_server_path);

        if mirrors.is_empty() {
            let records: Vec<ReplayableCfBreakpointRequest> = bp_line_and_ids
                .iter()
                .zip(conditions)
                .map(|(bp, condition)| ReplayableCfBreakpointRequest {
                    raw_ide_path: raw_ide_path.clone(),
                    canonical_server_path: canonical_server_path.clone(),
                    line: bp.line,
                    dap_breakpoint_id: bp.id,
                    condition: condition.clone(),
                    handle: None,
                })
                .collect();

            let results = records
                .iter()
                .map(|r| SetBreakpointResult {
                    dap_breakpoint_id: r.dap_breakpoint_id,
                    line: r.line,
                    state: BindState::Unbound,
                })
                .collect();

            self.by_path.insert(
                canonical_server_path,
                PathRecords { records },
            );

            return Ok(results);
        }

        let mut collected_mirrors = Vec::new();
        let mut last_results = Vec::new();
        let mut last_records = Vec::new();

        for mirror in &mirrors {
            let (records, results, collected) = self.bind_one_mirror(
                &raw_ide_path,
                &canonical_server_path,
                mirror,
                &bp_line_and_ids,
                conditions,
            )?;
            if collected {
                collected_mirrors.push(mirror.token);
            }
            last_records = records;
            last_results = results;
        }

        for token in collected_mirrors {
            self.class_registry.remove(&canonical_server_path, token);
        }

        self.by_path.insert(
            canonical_server_path,
            PathRecords {
                records: last_records,
            },
        );

        Ok(last_results)
    }

    /// Runs the binding procedure for one mirror, returning the resulting
    /// replayable records, the per-line results, and whether the mirror was
    /// found to be collected mid-bind.
    fn bind_one_mirror(
        &self,
        raw_ide_path: &RawIdePath,
        canonical_server_path: &CanonicalServerPath,
        mirror: &KlassMap,
        bp_line_and_ids: &[BpLineAndId],
        conditions: &[Option<String>],
    ) -> Result<(Vec<ReplayableCfBreakpointRequest>, Vec<SetBreakpointResult>, bool), DebugCoreError> {
        let mut records = Vec::with_capacity(bp_line_and_ids.len());
        let mut results = Vec::with_capacity(bp_line_and_ids.len());
        let mut mirror_collected = false;

        for (bp, condition) in bp_line_and_ids.iter().zip(conditions) {
            let (record, state, collected) = self.bind_one_line(
                raw_ide_path,
                canonical_server_path,
                mirror,
                bp,
                condition.clone(),
            )?;
            mirror_collected |= collected;
            results.push(SetBreakpointResult {
                dap_breakpoint_id: bp.id,
                line: bp.line,
                state,
            });
            records.push(record);
        }

        Ok((records, results, mirror_collected))
    }

    /// Per-line binding (§4.4 "Per-line binding"). The returned bool is true
    /// when the attempt discovered that `mirror`'s underlying class has been
    /// collected, in which case the caller drops the whole mirror.
    fn bind_one_line(
        &self,
        raw_ide_path: &RawIdePath,
        canonical_server_path: &CanonicalServerPath,
        mirror: &KlassMap,
        bp: &BpLineAndId,
        condition: Option<String>,
    ) -> Result<(ReplayableCfBreakpointRequest, BindState, bool), DebugCoreError> {
        let Some(location) = mirror.location_for_line(bp.line) else {
            return Ok((
                ReplayableCfBreakpointRequest {
                    raw_ide_path: raw_ide_path.clone(),
                    canonical_server_path: canonical_server_path.clone(),
                    line: bp.line,
                    dap_breakpoint_id: bp.id,
                    condition,
                    handle: None,
                },
                BindState::Unbound,
                false,
            ));
        };

        let set_result = self.session.send(event_request::Set::new(
            EventKind::Breakpoint,
            SuspendPolicy::EventThread,
            vec![Modifier::LocationOnly(location)],
        ));

        let request_id = match set_result {
            Ok(id) => id,
            Err(ClientError::Jdwp(
                ErrorCode::InvalidClass | ErrorCode::ClassNotPrepared | ErrorCode::InvalidObject,
            )) => {
                return Ok((
                    ReplayableCfBreakpointRequest {
                        raw_ide_path: raw_ide_path.clone(),
                        canonical_server_path: canonical_server_path.clone(),
                        line: bp.line,
                        dap_breakpoint_id: bp.id,
                        condition,
                        handle: None,
                    },
                    BindState::Unbound,
                    true,
                ));
            }
            Err(other) => return Err(other.into()),
        };

        self.by_request_id
            .insert(request_id, (canonical_server_path.clone(), bp.id));

        Ok((
            ReplayableCfBreakpointRequest {
                raw_ide_path: raw_ide_path.clone(),
                canonical_server_path: canonical_server_path.clone(),
                line: bp.line,
                dap_breakpoint_id: bp.id,
                condition,
                handle: Some(request_id),
            },
            BindState::Bound,
            false,
        ))
    }

    fn existing_ids_by_line(
        &self,
        path: &CanonicalServerPath,
    ) -> std::collections::HashMap<u32, DapBreakpointId> {
        self.by_path
            .get(path)
            .map(|entry| {
                entry
                    .records
                    .iter()
                    .map(|r| (r.line, r.dap_breakpoint_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rebinding driven by a class-prepare event (§4.4 "Rebinding"). Returns
    /// the records whose bound-state changed, for the caller to turn into a
    /// `BreakpointsChanged` callback.
    pub fn rebind_for_new_mirror(
        &self,
        canonical_server_path: &CanonicalServerPath,
        mirror: &KlassMap,
    ) -> Result<Vec<BreakpointsChanged>, DebugCoreError> {
        let Some(mut entry) = self.by_path.get_mut(canonical_server_path) else {
            return Ok(Vec::new());
        };

        let mut changed = Vec::new();
        let mut rebuilt = Vec::with_capacity(entry.records.len());

        for record in entry.records.drain(..) {
            let was_bound = record.is_bound();
            let bp = BpLineAndId {
                line: record.line,
                id: record.dap_breakpoint_id,
            };
            let (new_record, state, _collected) = self.bind_one_line(
                &record.raw_ide_path,
                canonical_server_path,
                mirror,
                &bp,
                record.condition.clone(),
            )?;
            let now_bound = state == BindState::Bound;
            if now_bound != was_bound {
                changed.push(BreakpointsChanged {
                    dap_breakpoint_id: record.dap_breakpoint_id,
                    line: record.line,
                    state,
                });
            }
            rebuilt.push(new_record);
        }

        entry.records = rebuilt;
        Ok(changed)
    }

    /// `clearExistingBreakpoints(path)` (§4.4): drops every replayable
    /// record for `path` and deletes their JDWP requests. Idempotent.
    pub fn clear_existing_breakpoints(&self, path: &CanonicalServerPath) {
        if let Some((_, records)) = self.by_path.remove(path) {
            for record in records.records {
                if let Some(request_id) = record.handle {
                    self.by_request_id.remove(&request_id);
                    let _ = self
                        .session
                        .send(event_request::Clear::new(EventKind::Breakpoint, request_id));
                }
            }
        }
    }

    /// `clearAllBreakpoints` (§4.4): clears the whole registry and deletes
    /// every JDWP breakpoint request on the VM in one batch call.
    pub fn clear_all_breakpoints(&self) -> Result<(), DebugCoreError> {
        self.by_path.clear();
        self.by_request_id.clear();
        self.session.send(event_request::ClearAllBreakpoints)?;
        Ok(())
    }

    /// Looks up which (path, dapBreakpointId) a JDWP breakpoint hit belongs
    /// to, for the event pump (§4.6).
    pub fn lookup_by_request_id(
        &self,
        request_id: RequestID,
    ) -> Option<(CanonicalServerPath, DapBreakpointId)> {
        self.by_request_id.get(&request_id).map(|e| e.value().clone())
    }

    /// Condition expression attached to one breakpoint, if any (§4.4
    /// "Conditional evaluation").
    pub fn condition_for(
        &self,
        path: &CanonicalServerPath,
        dap_breakpoint_id: DapBreakpointId,
    ) -> Option<String> {
        self.by_path.get(path).and_then(|entry| {
            entry
                .records
                .iter()
                .find(|r| r.dap_breakpoint_id == dap_breakpoint_id)
                .and_then(|r| r.condition.clone())
        })
    }

    /// Evaluates a breakpoint's condition against the thread currently
    /// stopped at it. A breakpoint with no condition always evaluates true.
    pub fn evaluate_condition(
        &self,
        path: &CanonicalServerPath,
        dap_breakpoint_id: DapBreakpointId,
        native_thread: &Arc<H>,
    ) -> bool {
        match self.condition_for(path, dap_breakpoint_id) {
            Some(expr) => self
                .debug_manager
                .evaluate_as_boolean_for_conditional_breakpoint(native_thread, &expr),
            None => true,
        }
    }

    pub fn list_breakpoints(&self, path: &CanonicalServerPath) -> Vec<ReplayableCfBreakpointRequest> {
        self.by_path
            .get(path)
            .map(|e| e.records.clone())
            .unwrap_or_default()
    }

    pub fn tracked_paths(&self) -> Vec<CanonicalServerPath> {
        self.by_path.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp::types::JdwpId;

    #[test]
    fn bind_state_distinguishes_bound_from_unbound() {
        assert_ne!(BindState::Bound, BindState::Unbound);
    }

    #[test]
    fn replayable_equality_ignores_handle() {
        let a = ReplayableCfBreakpointRequest {
            raw_ide_path: RawIdePath("/home/u/a.cf".into()),
            canonical_server_path: CanonicalServerPath("/srv/a.cf".into()),
            line: 10,
            dap_breakpoint_id: DapBreakpointId(1),
            condition: None,
            handle: None,
        };
        let mut b = a.clone();
        b.handle = Some(RequestID::from_raw(42));
        assert_eq!(a, b);
    }
}
