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

//! Chrome DevTools Protocol wire types.
//!
//! Only the parts of the `Debugger` and `Runtime` domains served by the bridge
//! are modelled. Field names follow the protocol's camelCase convention, and
//! optional fields are omitted from the JSON when unset.

/// Debugger domain parameters, results and events
pub mod debugger;
/// Runtime domain parameters, results and shared object types
pub mod runtime;

pub use debugger::*;
pub use runtime::*;

use serde::{Deserialize, Serialize};

/// Protocol version reported by the discovery endpoint.
pub const PROTOCOL_VERSION: &str = "1.3";

/// An event the bridge can push to clients.
pub trait CdpEvent: Serialize {
    /// Fully qualified event name, e.g. `Debugger.paused`.
    const METHOD: &'static str;
}

/// Parameters of methods that take none. Unknown fields are ignored so
/// clients may send protocol options the bridge does not act on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NoParams {}

/// Result of methods that return nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
