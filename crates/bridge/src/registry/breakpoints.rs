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

use std::{cmp::Ordering, collections::HashMap};

use cdp_bridge_common::types::{BreakLocation, BreakpointId, Location};
use regex::Regex;

use super::Source;
use crate::debuggee::BreakPoint;

/// A breakpoint bound to one script: where the client sees it and what the
/// engine was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBreakPoint {
    /// Protocol location
    pub location: Location,
    /// Engine breakpoint, 1-based line
    pub breakpoint: BreakPoint,
}

impl ResolvedBreakPoint {
    /// Bind `location` of `source` with an optional condition.
    pub fn new(source: &Source, location: &BreakLocation, condition: Option<String>) -> Self {
        let column = location.column_number.unwrap_or(0);
        Self {
            location: Location {
                script_id: source.script_id().to_string(),
                line_number: location.line_number,
                column_number: Some(column),
            },
            breakpoint: BreakPoint {
                source_key: source.key().to_string(),
                line: location.line_number + 1,
                column,
                condition,
            },
        }
    }
}

/// A URL/hash keyed breakpoint request, bound to every matching script.
#[derive(Debug, Clone)]
pub struct PendingBreakPoint {
    url: Option<String>,
    url_regex: Option<Regex>,
    script_hash: Option<String>,
    line: u32,
    column: u32,
    condition: Option<String>,
    bound: Vec<ResolvedBreakPoint>,
}

impl PendingBreakPoint {
    /// Create a request for protocol position (`line`, `column`).
    pub fn new(line: u32, column: u32, condition: Option<String>) -> Self {
        Self { url: None, url_regex: None, script_hash: None, line, column, condition, bound: Vec::new() }
    }

    /// Match scripts with exactly this URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Match scripts whose URL matches `regex`
    pub fn with_url_regex(mut self, regex: Regex) -> Self {
        self.url_regex = Some(regex);
        self
    }

    /// Match scripts with this content hash
    pub fn with_script_hash(mut self, hash: impl Into<String>) -> Self {
        self.script_hash = Some(hash.into());
        self
    }

    /// Whether `source` is one of the scripts this request targets. Any one of
    /// URL, hash or URL pattern is sufficient.
    pub fn matches(&self, source: &Source) -> bool {
        self.url.as_deref() == Some(source.url())
            || self.script_hash.as_deref() == Some(source.hash())
            || self.url_regex.as_ref().is_some_and(|regex| regex.is_match(source.url()))
    }

    /// Resolve against `source`, if it has any breakable location.
    pub fn resolve(&self, source: &Source) -> Option<ResolvedBreakPoint> {
        let location = source.find_nearest_break(self.line, self.column)?;
        Some(ResolvedBreakPoint::new(source, location, self.condition.clone()))
    }

    /// Record a binding produced by this request.
    pub fn bind(&mut self, resolved: ResolvedBreakPoint) {
        self.bound.push(resolved);
    }

    /// Bindings produced so far.
    pub fn bound(&self) -> &[ResolvedBreakPoint] {
        &self.bound
    }

    fn is_bound_to(&self, source: &Source) -> bool {
        self.bound.iter().any(|resolved| resolved.breakpoint.source_key == source.key())
    }
}

/// Numeric order of decimal id strings.
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Concrete and pending breakpoints, sharing one id counter.
#[derive(Debug, Default)]
pub(crate) struct BreakpointTable {
    last_id: u64,
    concrete: HashMap<BreakpointId, ResolvedBreakPoint>,
    pending: HashMap<BreakpointId, PendingBreakPoint>,
}

impl BreakpointTable {
    fn next_id(&mut self) -> BreakpointId {
        self.last_id += 1;
        self.last_id.to_string()
    }

    pub(crate) fn insert(&mut self, resolved: ResolvedBreakPoint) -> BreakpointId {
        let id = self.next_id();
        self.concrete.insert(id.clone(), resolved);
        id
    }

    pub(crate) fn insert_pending(&mut self, pending: PendingBreakPoint) -> BreakpointId {
        let id = self.next_id();
        self.pending.insert(id.clone(), pending);
        id
    }

    /// Bind every pending request that targets `source` and is not yet bound
    /// to it.
    pub(crate) fn bind_source(&mut self, source: &Source) -> Vec<(BreakpointId, ResolvedBreakPoint)> {
        let mut resolved = Vec::new();
        for (id, pending) in &mut self.pending {
            if !pending.matches(source) || pending.is_bound_to(source) {
                continue;
            }
            if let Some(binding) = pending.resolve(source) {
                pending.bind(binding.clone());
                resolved.push((id.clone(), binding));
            }
        }
        resolved.sort_by(|(a, _), (b, _)| compare_ids(a, b));
        resolved
    }

    /// Remove `id` from whichever table holds it; pending requests are checked
    /// first. Returns the engine breakpoints to retract.
    pub(crate) fn remove(&mut self, id: &str) -> Vec<BreakPoint> {
        if let Some(pending) = self.pending.remove(id) {
            return pending.bound.into_iter().map(|resolved| resolved.breakpoint).collect();
        }
        self.concrete.remove(id).map(|resolved| resolved.breakpoint).into_iter().collect()
    }

    /// Ids of every breakpoint bound at an engine position.
    pub(crate) fn ids_at(&self, source_key: &str, line: u32, column: u32) -> Vec<BreakpointId> {
        let at = |bp: &BreakPoint| bp.source_key == source_key && bp.line == line && bp.column == column;

        let mut ids: Vec<BreakpointId> = self
            .concrete
            .iter()
            .filter(|(_, resolved)| at(&resolved.breakpoint))
            .map(|(id, _)| id.clone())
            .chain(
                self.pending
                    .iter()
                    .filter(|(_, pending)| pending.bound.iter().any(|r| at(&r.breakpoint)))
                    .map(|(id, _)| id.clone()),
            )
            .collect();
        ids.sort_by(|a, b| compare_ids(a, b));
        ids
    }

    pub(crate) fn len(&self) -> usize {
        self.concrete.len() + self.pending.len()
    }
}
