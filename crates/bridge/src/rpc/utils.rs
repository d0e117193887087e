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

//! Small helpers shared by the router and the domain methods.

use crate::registry::ObjectId;

/// Split `Domain.function` into its two halves. Both must be non-empty.
pub fn split_method(method: &str) -> Option<(&str, &str)> {
    let (domain, function) = method.split_once('.')?;
    if domain.is_empty() || function.is_empty() || function.contains('.') {
        return None;
    }
    Some((domain, function))
}

/// Parse a remote object id as handed out by the registry.
pub fn parse_object_id(object_id: &str) -> Option<ObjectId> {
    object_id.parse().ok()
}

/// A fresh random debugger id, formatted like a GUID.
pub fn new_debugger_id() -> String {
    let hex = format!("{:032x}", rand::random::<u128>());
    format!("{}-{}-{}-{}-{}", &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..])
}
