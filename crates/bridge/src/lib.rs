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

//! CDP Bridge - expose an embedded script engine's debugger to Chrome
//! DevTools Protocol clients.
//!
//! The engine implements [`ScriptEngine`] and calls the hooks of a
//! [`DebugAgent`]; the agent serves discovery documents and WebSocket
//! sessions, keeps track of scripts, breakpoints and remote objects, and parks
//! the engine thread while a client inspects a pause.
//!
//! ```rust,ignore
//! let agent = DebugAgent::new(Arc::new(engine), BridgeConfig::from_env()?);
//! let server = agent.serve().await?;
//!
//! // engine thread
//! agent.on_parsed("main", "file:///main.js", source, ast);
//! let mode = agent.on_step(info);
//! ```

pub mod agent;
pub mod break_locations;
pub mod config;
pub mod coordinator;
pub mod debuggee;
pub mod inspect;
pub mod registry;
pub mod rpc;

pub use agent::DebugAgent;
pub use config::BridgeConfig;
pub use coordinator::{DebugCoordinator, DebugNotification, ExecutionState};
pub use debuggee::*;
pub use inspect::Inspector;
pub use registry::{RuntimeRegistry, Source};
pub use rpc::{CdpHandler, ServerHandle};
