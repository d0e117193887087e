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

//! Environment variable name constants for CDP Bridge configuration.
//!
//! These constants are the single source of truth for the variables read by
//! `BridgeConfig::from_env`. Every variable is optional; unset variables leave
//! the corresponding default in place.
//!
//! # Environment Variables
//!
//! - [`CDP_BRIDGE_HOST`] - Host the discovery/WebSocket server binds to
//! - [`CDP_BRIDGE_PORT`] - Port the server binds to
//! - [`CDP_BRIDGE_NAME`] - Display name advertised to DevTools clients
//! - [`CDP_BRIDGE_FAVICON_URL`] - Favicon advertised in the target list
//! - [`CDP_BRIDGE_PAUSE_ON_START`] - Whether the engine halts on its first statement

/// Host name or IP address the server listens on.
///
/// # Default
///
/// `127.0.0.1`
pub const CDP_BRIDGE_HOST: &str = "CDP_BRIDGE_HOST";

/// Port the server listens on. `0` picks an ephemeral port.
///
/// # Default
///
/// `9222`, the conventional remote debugging port.
pub const CDP_BRIDGE_PORT: &str = "CDP_BRIDGE_PORT";

/// Display name reported in `/json/version` and `/json/list`.
pub const CDP_BRIDGE_NAME: &str = "CDP_BRIDGE_NAME";

/// Favicon URL reported in `/json/list`.
pub const CDP_BRIDGE_FAVICON_URL: &str = "CDP_BRIDGE_FAVICON_URL";

/// Whether single-step interception is armed before the first statement runs.
///
/// Accepts `true`/`false`/`1`/`0`.
pub const CDP_BRIDGE_PAUSE_ON_START: &str = "CDP_BRIDGE_PAUSE_ON_START";
