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

//! CDP Bridge Common - shared functionality for CDP Bridge components
//!
//! This crate holds the engine-agnostic pieces of the bridge: logging setup,
//! environment variable names, the V8-compatible script hash, text position
//! helpers and the Chrome DevTools Protocol wire types.

/// Environment variable names recognised by CDP Bridge components
pub mod env;
/// Logging setup and utilities for consistent logging across components
pub mod logging;
/// V8-compatible script content hash
pub mod script_hash;
/// Helpers for measuring script text in UTF-16 code units
pub mod text;
/// Chrome DevTools Protocol wire types for the Debugger and Runtime domains
pub mod types;

pub use script_hash::script_hash;
pub use text::*;
