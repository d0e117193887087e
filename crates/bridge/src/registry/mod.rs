// CDP Bridge - Chrome DevTools Protocol bridge for embedded script engines
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Session-wide identity tables.
//!
//! The registry assigns the identifiers the protocol hands to clients and
//! keeps them stable for the whole session:
//!
//! - **Sources**: one protocol script id per engine source key, assigned in
//!   order of first appearance and never reused.
//! - **Breakpoints**: concrete (`Debugger.setBreakpoint`) and pending
//!   (`Debugger.setBreakpointByUrl`) breakpoints, numbered from one shared
//!   counter.
//! - **Objects**: remote object ids, unique per object identity, optionally
//!   grouped for bulk release.
//!
//! # Locking
//!
//! Scripts are registered from the engine thread while requests arrive on
//! connection tasks, so each table sits behind its own lock. Where two locks
//! are needed the breakpoint table is always taken before the source table.

mod breakpoints;
mod objects;
mod source;

pub use breakpoints::{PendingBreakPoint, ResolvedBreakPoint};
pub use objects::{ObjectId, ObjectRecord, ObjectTarget};
pub use source::{Source, DEFAULT_EXECUTION_CONTEXT_ID};

use std::{collections::HashMap, hash::Hash, sync::Arc};

use cdp_bridge_common::types::{BreakpointId, ScriptId};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use self::{breakpoints::BreakpointTable, objects::ObjectTable};
use crate::debuggee::{Binding, BreakPoint, ScriptAst};

/// Outcome of [`RuntimeRegistry::add_source`].
#[derive(Debug, Clone)]
pub struct SourceAdded {
    /// The registered script
    pub source: Arc<Source>,
    /// Whether this call created it
    pub is_new: bool,
}

#[derive(Debug, Default)]
struct SourceTable {
    /// Scripts in order of first appearance
    ordered: Vec<Arc<Source>>,
    by_key: HashMap<String, Arc<Source>>,
    by_script_id: HashMap<ScriptId, Arc<Source>>,
}

/// Owner of the source, breakpoint and object tables.
#[derive(Debug)]
pub struct RuntimeRegistry<O> {
    sources: RwLock<SourceTable>,
    breakpoints: Mutex<BreakpointTable>,
    objects: Mutex<ObjectTable<O>>,
}

impl<O> Default for RuntimeRegistry<O> {
    fn default() -> Self {
        Self {
            sources: RwLock::default(),
            breakpoints: Mutex::default(),
            objects: Mutex::new(ObjectTable::default()),
        }
    }
}

impl<O: Clone + Eq + Hash> RuntimeRegistry<O> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parsed script. Idempotent per `key`: later calls return the
    /// script registered first, with its original id.
    pub fn add_source(
        &self,
        key: &str,
        url: &str,
        text: &str,
        ast: Arc<dyn ScriptAst>,
    ) -> SourceAdded {
        let mut sources = self.sources.write();
        if let Some(source) = sources.by_key.get(key) {
            return SourceAdded { source: source.clone(), is_new: false };
        }

        let script_id = (sources.ordered.len() + 1).to_string();
        let source = Arc::new(Source::new(
            script_id.clone(),
            key.to_string(),
            url.to_string(),
            text.to_string(),
            ast,
        ));
        sources.ordered.push(source.clone());
        sources.by_key.insert(key.to_string(), source.clone());
        sources.by_script_id.insert(script_id, source.clone());

        debug!(key, script_id = source.script_id(), url, "Registered source");
        SourceAdded { source, is_new: true }
    }

    /// Script with protocol id `script_id`
    pub fn source(&self, script_id: &str) -> Option<Arc<Source>> {
        self.sources.read().by_script_id.get(script_id).cloned()
    }

    /// Script with engine key `key`
    pub fn source_by_key(&self, key: &str) -> Option<Arc<Source>> {
        self.sources.read().by_key.get(key).cloned()
    }

    /// All scripts in order of first appearance
    pub fn sources(&self) -> Vec<Arc<Source>> {
        self.sources.read().ordered.clone()
    }

    /// Scripts targeted by a pending breakpoint request
    pub fn sources_matching(&self, pending: &PendingBreakPoint) -> Vec<Arc<Source>> {
        self.sources.read().ordered.iter().filter(|source| pending.matches(source)).cloned().collect()
    }

    /// Record a concrete breakpoint.
    pub fn add_breakpoint(&self, resolved: ResolvedBreakPoint) -> BreakpointId {
        self.breakpoints.lock().insert(resolved)
    }

    /// Record a pending breakpoint and bind it to every script that already
    /// matches. Returns its id and the new bindings.
    pub fn add_pending_breakpoint(
        &self,
        mut pending: PendingBreakPoint,
    ) -> (BreakpointId, Vec<ResolvedBreakPoint>) {
        let mut breakpoints = self.breakpoints.lock();
        for source in self.sources_matching(&pending) {
            if let Some(resolved) = pending.resolve(&source) {
                pending.bind(resolved);
            }
        }
        let bound = pending.bound().to_vec();
        (breakpoints.insert_pending(pending), bound)
    }

    /// Bind pending breakpoints to a newly registered script.
    pub fn bind_pending(&self, source: &Source) -> Vec<(BreakpointId, ResolvedBreakPoint)> {
        self.breakpoints.lock().bind_source(source)
    }

    /// Remove a breakpoint by id. Returns the engine breakpoints it owned,
    /// empty for an unknown id.
    pub fn remove_breakpoint(&self, id: &str) -> Vec<BreakPoint> {
        self.breakpoints.lock().remove(id)
    }

    /// Ids of breakpoints bound at an engine position (1-based line).
    pub fn breakpoints_at(&self, source_key: &str, line: u32, column: u32) -> Vec<BreakpointId> {
        self.breakpoints.lock().ids_at(source_key, line, column)
    }

    /// Number of concrete plus pending breakpoints
    pub fn breakpoint_count(&self) -> usize {
        self.breakpoints.lock().len()
    }

    /// Id of `object`, assigning one under `group` if it is not tracked yet.
    pub fn get_or_assign_object_id(&self, object: &O, group: Option<&str>) -> ObjectId {
        self.objects.lock().get_or_assign(object, group, false)
    }

    /// Like [`Self::get_or_assign_object_id`], flagging the object as a scope.
    pub fn get_or_assign_scope_id(&self, object: &O, group: Option<&str>) -> ObjectId {
        self.objects.lock().get_or_assign(object, group, true)
    }

    /// Fresh id for a scope that has no backing object.
    pub fn assign_bindings_id(&self, bindings: Vec<Binding<O>>, group: Option<&str>) -> ObjectId {
        self.objects.lock().assign_bindings(bindings, group)
    }

    /// Record for `id`
    pub fn object(&self, id: ObjectId) -> Option<ObjectRecord<O>> {
        self.objects.lock().get(id)
    }

    /// Release one object id. Returns whether it was tracked.
    pub fn release_object(&self, id: ObjectId) -> bool {
        self.objects.lock().release(id)
    }

    /// Release every id of `group`. Returns how many were still tracked.
    pub fn release_object_group(&self, group: &str) -> usize {
        self.objects.lock().release_group(group)
    }

    /// Number of tracked objects
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }
}
