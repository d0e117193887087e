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

//! DevTools measures script text in UTF-16 code units, the same way JavaScript
//! strings do. These helpers keep that convention in one place.

use serde::{Deserialize, Serialize};

/// A zero-based (line, column) position within a script, column in UTF-16 units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPosition {
    /// Zero-based line
    pub line_number: u32,
    /// Zero-based column
    pub column_number: u32,
}

impl TextPosition {
    /// Create a new position
    pub fn new(line_number: u32, column_number: u32) -> Self {
        Self { line_number, column_number }
    }
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Position just past the last character of `text`.
///
/// The line is the number of `\n` characters; the column is the UTF-16 length
/// of the final line.
pub fn end_position(text: &str) -> TextPosition {
    let (lines, last_line) = match text.rfind('\n') {
        Some(idx) => (text.matches('\n').count(), &text[idx + 1..]),
        None => (0, text),
    };
    TextPosition::new(lines as u32, utf16_len(last_line) as u32)
}
