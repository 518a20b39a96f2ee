//! Class registry (§4.3): maps canonical server source path -> set of class
//! mirrors (`KlassMap`), built from class-prepare events.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use jdwp::{
    commands::{class_type, event::Event, event_request, method, reference_type, virtual_machine},
    enums::{ClassStatus, EventKind, SuspendPolicy},
    types::{
        ClassID, JdwpId, Location, Modifier, ReferenceTypeID, RequestID, TaggedReferenceTypeID,
    },
};

use crate::{error::DebugCoreError, ids::CanonicalServerPath, session::Session};

/// Unique per-mirror identity token, used to tell two mirrors at the same
/// path apart even if their line tables happen to coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassToken(pub ReferenceTypeID);

/// In-adapter representation of one loaded class derived from the language's
/// base page class.
#[derive(Debug, Clone)]
pub struct KlassMap {
    pub token: ClassToken,
    pub path: CanonicalServerPath,
    pub status: ClassStatus,
    /// JNI signature, used to match this mirror against class-unload events
    /// (which carry a signature but no reference type id).
    pub signature: String,
    /// Sparse: only lines with emitted code appear here.
    line_table: HashMap<u32, Location>,
}

impl KlassMap {
    /// Builds a mirror for one reference type by walking its methods and
    /// concatenating their line tables (§3 "Class mirror").
    ///
    /// Returns `Ok(None)` rather than an error for classes with no usable
    /// line information (abstract/native-only classes) — per §7 this is a
    /// "class mirror build failure", which is routine and skipped rather than
    /// fatal.
    pub fn build(
        session: &Session,
        reference_id: ReferenceTypeID,
        path: CanonicalServerPath,
        status: ClassStatus,
    ) -> Result<Option<KlassMap>, DebugCoreError> {
        let signature = session.send(reference_type::Signature::new(reference_id))?;
        let methods = session.send(reference_type::Methods::new(reference_id))?;

        let mut line_table = HashMap::new();
        for method in methods {
            let reply = session.send(method::LineTable::new(reference_id, method.method_id))?;
            for line in reply.lines {
                let location = Location {
                    reference_id: TaggedReferenceTypeID::Class(ClassID::from_raw(
                        reference_id.raw(),
                    )),
                    method_id: method.method_id,
                    index: line.line_code_index,
                };
                // First-wins: a method's own first code index for a line is
                // the one we want to breakpoint at.
                line_table.entry(line.line_number).or_insert(location);
            }
        }

        if line_table.is_empty() {
            return Ok(None);
        }

        Ok(Some(KlassMap {
            token: ClassToken(reference_id),
            path,
            status,
            signature,
            line_table,
        }))
    }

    pub fn location_for_line(&self, line: u32) -> Option<Location> {
        self.line_table.get(&line).copied()
    }

    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.line_table.keys().copied()
    }
}

/// Maps canonical server paths to the set of mirrors currently backing them.
#[derive(Default)]
pub struct ClassRegistry {
    by_path: DashMap<CanonicalServerPath, Vec<KlassMap>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mirror: KlassMap) {
        self.by_path
            .entry(mirror.path.clone())
            .or_default()
            .push(mirror);
    }

    pub fn mirrors_for(&self, path: &CanonicalServerPath) -> Vec<KlassMap> {
        self.by_path.get(path).map(|v| v.clone()).unwrap_or_default()
    }

    pub fn has_mirrors(&self, path: &CanonicalServerPath) -> bool {
        self.by_path.get(path).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Removes a collected mirror from its path's set. A no-op if the path or
    /// the token isn't present (§4.4 "class collection mid-bind").
    pub fn remove(&self, path: &CanonicalServerPath, token: ClassToken) {
        if let Some(mut mirrors) = self.by_path.get_mut(path) {
            mirrors.retain(|m| m.token != token);
        }
    }

    pub fn paths(&self) -> Vec<CanonicalServerPath> {
        self.by_path.iter().map(|e| e.key().clone()).collect()
    }

    /// Drops every mirror matching `signature` across all paths, in response
    /// to a class-unload event (§4.3). Class-unload carries a signature but
    /// no reference type id, so this is the only way to find the victim.
    pub fn remove_by_signature(&self, signature: &str) {
        for mut entry in self.by_path.iter_mut() {
            entry.retain(|m| m.signature != signature);
        }
    }
}

/// Runs the two-branch class-prepare subscription bootstrap described in
/// §4.3 and resolved in §9: installs (and explicitly enables) a class-prepare
/// request once the base page class is known to be loaded, waiting on a
/// one-shot prepare of the base class itself first if it isn't yet.
///
/// JDWP's `ClassMatch` modifier can only glob on a name, not express "is a
/// subtype of" — so the returned request is deliberately unfiltered, and
/// callers are expected to test each delivered prepare with
/// [`is_subclass_of_base`] before building a mirror for it.
pub fn bootstrap_class_prepare_subscription(
    session: &Session,
    base_page_class_binary_name: &str,
    timeout: Duration,
) -> Result<RequestID, DebugCoreError> {
    let base_signature = format!("L{base_page_class_binary_name};");
    let deadline = Instant::now() + timeout;

    if find_loaded_class(session, &base_signature)?.is_some() {
        return Ok(session.send(event_request::Set::new(
            EventKind::ClassPrepare,
            SuspendPolicy::EventThread,
            Vec::new(),
        ))?);
    }

    let dotted = base_page_class_binary_name.replace('/', ".");
    let one_shot = session.send(event_request::Set::new(
        EventKind::ClassPrepare,
        SuspendPolicy::EventThread,
        vec![Modifier::ClassMatch(dotted)],
    ))?;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DebugCoreError::Invariant(
                "timed out waiting for the base page class to prepare".into(),
            ));
        }
        let Some(composite) = session.recv_event_timeout(remaining) else {
            return Err(DebugCoreError::Invariant(
                "timed out waiting for the base page class to prepare".into(),
            ));
        };

        for event in composite.events {
            if let Event::ClassPrepare(req, thread, _type_id, _signature, _status) = event {
                if req == one_shot {
                    session.send(event_request::Clear::new(EventKind::ClassPrepare, req))?;
                    let request_id = session.send(event_request::Set::new(
                        EventKind::ClassPrepare,
                        SuspendPolicy::EventThread,
                        Vec::new(),
                    ))?;
                    session.send(jdwp::commands::thread_reference::Resume::new(thread))?;
                    return Ok(request_id);
                }
            }
        }
    }
}

/// True if `class_id` is `base_signature` itself or a descendant of it,
/// walking the superclass chain one link at a time.
pub fn is_subclass_of_base(
    session: &Session,
    class_id: ClassID,
    base_signature: &str,
) -> Result<bool, DebugCoreError> {
    let mut current = class_id;
    loop {
        let ref_id = ReferenceTypeID::from_raw(current.raw());
        let signature = session.send(reference_type::Signature::new(ref_id))?;
        if signature == base_signature {
            return Ok(true);
        }
        match session.send(class_type::Superclass::new(ref_id))? {
            Some(parent) => current = parent,
            None => return Ok(false),
        }
    }
}

fn find_loaded_class(session: &Session, signature: &str) -> Result<Option<ClassID>, DebugCoreError> {
    let classes = session.send(virtual_machine::ClassesBySignature::new(signature))?;
    Ok(classes.into_iter().find_map(|(type_id, _status)| match type_id {
        TaggedReferenceTypeID::Class(id) => Some(id),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_mirror(path: &str, token: u64) -> KlassMap {
        KlassMap {
            token: ClassToken(ReferenceTypeID::from_raw(token)),
            path: CanonicalServerPath(path.to_owned()),
            status: ClassStatus::PREPARED,
            signature: format!("Lfake/Class{token};"),
            line_table: HashMap::new(),
        }
    }

    #[test]
    fn insert_and_lookup_by_path() {
        let registry = ClassRegistry::new();
        registry.insert(fake_mirror("/srv/a.cf", 1));
        assert!(registry.has_mirrors(&CanonicalServerPath("/srv/a.cf".into())));
        assert!(!registry.has_mirrors(&CanonicalServerPath("/srv/b.cf".into())));
    }

    #[test]
    fn remove_drops_only_the_matching_token() {
        let registry = ClassRegistry::new();
        let path = CanonicalServerPath("/srv/a.cf".into());
        let first = fake_mirror("/srv/a.cf", 1);
        let second = fake_mirror("/srv/a.cf", 2);
        let second_token = second.token;
        registry.insert(first);
        registry.insert(second);

        registry.remove(&path, ClassToken(ReferenceTypeID::from_raw(1)));

        let remaining = registry.mirrors_for(&path);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].token, second_token);
    }

    #[test]
    fn remove_by_signature_drops_the_matching_mirror_across_paths() {
        let registry = ClassRegistry::new();
        registry.insert(fake_mirror("/srv/a.cf", 1));
        registry.insert(fake_mirror("/srv/b.cf", 2));

        registry.remove_by_signature("Lfake/Class1;");

        assert!(!registry.has_mirrors(&CanonicalServerPath("/srv/a.cf".into())));
        assert!(registry.has_mirrors(&CanonicalServerPath("/srv/b.cf".into())));
    }
}
