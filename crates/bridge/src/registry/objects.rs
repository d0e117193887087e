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

use std::{collections::HashMap, hash::Hash, sync::Arc};

use crate::debuggee::Binding;

/// Numeric remote object id. Rendered as a decimal string on the wire.
pub type ObjectId = u64;

/// What a remote object id refers to.
#[derive(Debug, Clone)]
pub enum ObjectTarget<O> {
    /// An engine object
    Object(O),
    /// An engine object backing a scope (global or `with` scope)
    ScopeObject(O),
    /// A declarative scope without a backing object
    Bindings(Arc<Vec<Binding<O>>>),
}

/// A tracked remote object.
#[derive(Debug, Clone)]
pub struct ObjectRecord<O> {
    /// Id handed to the client
    pub id: ObjectId,
    /// Referenced value
    pub target: ObjectTarget<O>,
    /// Group the id was created under
    pub group: Option<String>,
}

impl<O> ObjectRecord<O> {
    /// Whether the record stands for a scope rather than an ordinary object.
    pub fn is_scope(&self) -> bool {
        !matches!(self.target, ObjectTarget::Object(_))
    }
}

/// Object identity table: id -> record, object -> id, group -> ids.
#[derive(Debug)]
pub(crate) struct ObjectTable<O> {
    last_id: ObjectId,
    records: HashMap<ObjectId, ObjectRecord<O>>,
    ids: HashMap<O, ObjectId>,
    groups: HashMap<String, Vec<ObjectId>>,
}

impl<O> Default for ObjectTable<O> {
    fn default() -> Self {
        Self { last_id: 0, records: HashMap::new(), ids: HashMap::new(), groups: HashMap::new() }
    }
}

impl<O: Clone + Eq + Hash> ObjectTable<O> {
    fn allocate(&mut self, target: ObjectTarget<O>, group: Option<&str>) -> ObjectId {
        self.last_id += 1;
        let id = self.last_id;
        self.records.insert(id, ObjectRecord { id, target, group: group.map(str::to_string) });
        if let Some(group) = group {
            self.groups.entry(group.to_string()).or_default().push(id);
        }
        id
    }

    /// Existing id of `object`, or a fresh one registered under `group`.
    pub(crate) fn get_or_assign(&mut self, object: &O, group: Option<&str>, scope: bool) -> ObjectId {
        if let Some(&id) = self.ids.get(object) {
            return id;
        }
        let target =
            if scope { ObjectTarget::ScopeObject(object.clone()) } else { ObjectTarget::Object(object.clone()) };
        let id = self.allocate(target, group);
        self.ids.insert(object.clone(), id);
        id
    }

    /// Fresh id for a declarative scope.
    pub(crate) fn assign_bindings(&mut self, bindings: Vec<Binding<O>>, group: Option<&str>) -> ObjectId {
        self.allocate(ObjectTarget::Bindings(Arc::new(bindings)), group)
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<ObjectRecord<O>> {
        self.records.get(&id).cloned()
    }

    pub(crate) fn release(&mut self, id: ObjectId) -> bool {
        let Some(record) = self.records.remove(&id) else {
            return false;
        };
        match record.target {
            ObjectTarget::Object(object) | ObjectTarget::ScopeObject(object) => {
                self.ids.remove(&object);
            }
            ObjectTarget::Bindings(_) => {}
        }
        if let Some(group) = record.group {
            if let Some(ids) = self.groups.get_mut(&group) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.groups.remove(&group);
                }
            }
        }
        true
    }

    /// Release every id created under `group` and forget the group.
    pub(crate) fn release_group(&mut self, group: &str) -> usize {
        let ids = self.groups.remove(group).unwrap_or_default();
        ids.into_iter().filter(|&id| self.release(id)).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
