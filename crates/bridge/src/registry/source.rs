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

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use cdp_bridge_common::{
    end_position, script_hash,
    types::{BreakLocation, ScriptId, ScriptParsedEvent},
    utf16_len, TextPosition,
};

use crate::{
    break_locations,
    debuggee::{ScriptAst, SourceLocation},
};

/// Execution context every script is reported in.
pub const DEFAULT_EXECUTION_CONTEXT_ID: u32 = 1;

/// A parsed script known to the registry.
///
/// Everything except the announcement flag and the lazily computed break
/// locations is fixed at construction.
pub struct Source {
    key: String,
    script_id: ScriptId,
    url: String,
    text: String,
    length: u32,
    end: TextPosition,
    hash: String,
    ast: Arc<dyn ScriptAst>,
    break_locations: OnceLock<Vec<BreakLocation>>,
    announced: AtomicBool,
}

impl Source {
    pub(crate) fn new(
        script_id: ScriptId,
        key: String,
        url: String,
        text: String,
        ast: Arc<dyn ScriptAst>,
    ) -> Self {
        Self {
            length: utf16_len(&text) as u32,
            end: end_position(&text),
            hash: script_hash(&text),
            key,
            script_id,
            url,
            text,
            ast,
            break_locations: OnceLock::new(),
            announced: AtomicBool::new(false),
        }
    }

    /// Engine-side source key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Protocol script id
    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    /// Script URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full script text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Position just past the end of the text
    pub fn end(&self) -> TextPosition {
        self.end
    }

    /// Breakable locations, sorted. Computed on first use.
    pub fn break_locations(&self) -> &[BreakLocation] {
        self.break_locations
            .get_or_init(|| break_locations::collect(&*self.ast, &self.script_id))
    }

    /// Resolve a requested (protocol) position to a breakable location.
    pub fn find_nearest_break(&self, line: u32, column: u32) -> Option<&BreakLocation> {
        break_locations::find_nearest(self.break_locations(), line, column)
    }

    /// Breakable locations between two protocol positions, inclusive.
    pub fn possible_breakpoints(
        &self,
        start: (u32, u32),
        end: Option<(u32, u32)>,
    ) -> &[BreakLocation] {
        break_locations::find_range(self.break_locations(), start, end)
    }

    /// Whether `location` is inside this script.
    pub fn contains(&self, location: &SourceLocation) -> bool {
        location.source_key == self.key
    }

    /// Mark the script as announced. Returns `true` for the one caller that
    /// flipped the flag.
    pub(crate) fn mark_announced(&self) -> bool {
        !self.announced.swap(true, Ordering::AcqRel)
    }

    /// Whether `Debugger.scriptParsed` was sent for this script.
    pub fn is_announced(&self) -> bool {
        self.announced.load(Ordering::Acquire)
    }

    /// The `Debugger.scriptParsed` event announcing this script.
    pub fn script_parsed_event(&self) -> ScriptParsedEvent {
        ScriptParsedEvent {
            script_id: self.script_id.clone(),
            url: self.url.clone(),
            start_line: 0,
            start_column: 0,
            end_line: self.end.line_number,
            end_column: self.end.column_number,
            execution_context_id: DEFAULT_EXECUTION_CONTEXT_ID,
            hash: self.hash.clone(),
            is_live_edit: false,
            source_map_url: String::new(),
            has_source_url: false,
            is_module: false,
            length: self.length,
            script_language: "JavaScript".to_string(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("key", &self.key)
            .field("script_id", &self.script_id)
            .field("url", &self.url)
            .field("length", &self.length)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}
