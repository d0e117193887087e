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

//! Breakable locations of a script and the lookups built on them.
//!
//! A script's breakable locations are every statement start plus the end of
//! every function body. They are collected once from the engine's AST, sorted
//! by (line, column), and then queried by binary search:
//!
//! - [`find_nearest`] maps a requested breakpoint position to the first
//!   breakable location at or after it. A request past the last location is
//!   clamped to the last location.
//! - [`find_range`] serves `Debugger.getPossibleBreakpoints`.

use cdp_bridge_common::types::{BreakLocation, BreakLocationType};

use crate::debuggee::{AstVisitor, ScriptAst, SourcePosition};

/// Collects break locations in protocol coordinates.
struct Collector<'a> {
    script_id: &'a str,
    locations: Vec<BreakLocation>,
}

impl Collector<'_> {
    fn push(&mut self, position: SourcePosition, kind: Option<BreakLocationType>) {
        self.locations.push(BreakLocation {
            script_id: self.script_id.to_string(),
            line_number: position.line.saturating_sub(1),
            column_number: Some(position.column),
            kind,
        });
    }
}

impl AstVisitor for Collector<'_> {
    fn statement(&mut self, start: SourcePosition) {
        self.push(start, None);
    }

    fn function_body_end(&mut self, end: SourcePosition) {
        self.push(end, Some(BreakLocationType::Return));
    }
}

/// Walk `ast` and return its break locations sorted by (line, column).
pub fn collect(ast: &dyn ScriptAst, script_id: &str) -> Vec<BreakLocation> {
    let mut collector = Collector { script_id, locations: Vec::new() };
    ast.walk(&mut collector);

    let mut locations = collector.locations;
    locations.sort_by_key(position_of);
    locations.dedup();
    locations
}

fn position_of(location: &BreakLocation) -> (u32, u32) {
    (location.line_number, location.column_number.unwrap_or(0))
}

fn search(locations: &[BreakLocation], line: u32, column: u32) -> Result<usize, usize> {
    locations.binary_search_by(|probe| position_of(probe).cmp(&(line, column)))
}

/// The location at `(line, column)`, else the first one after it, else the
/// last one. `None` only for an empty list.
pub fn find_nearest(locations: &[BreakLocation], line: u32, column: u32) -> Option<&BreakLocation> {
    match search(locations, line, column) {
        Ok(index) => locations.get(index),
        Err(index) => locations.get(index).or_else(|| locations.last()),
    }
}

/// Inclusive slice of locations between `start` and `end`.
///
/// A missed start moves forward to the next location, a missed end moves back
/// to the previous one (never before the first). Without `end` the slice runs
/// to the end of the script.
pub fn find_range(
    locations: &[BreakLocation],
    start: (u32, u32),
    end: Option<(u32, u32)>,
) -> &[BreakLocation] {
    let Some(last_index) = locations.len().checked_sub(1) else {
        return &[];
    };

    let first = match search(locations, start.0, start.1) {
        Ok(index) | Err(index) => index,
    };
    let last = match end {
        None => last_index,
        Some((line, column)) => match search(locations, line, column) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1).min(last_index),
        },
    };

    if first > last {
        return &[];
    }
    &locations[first..=last]
}
