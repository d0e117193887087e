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

//! Chrome DevTools Protocol server.
//!
//! DevTools clients find the debugger over HTTP and then talk to it over a
//! single WebSocket per client. Every client shares the one debugged engine.
//!
//! # Architecture
//!
//! - **Server** ([`server`]) - HTTP listener, WebSocket connections, broadcast
//!   and graceful shutdown
//! - **Discovery** ([`discovery`]) - `/json/version` and `/json/list` documents
//! - **Router** ([`router`]) - maps `Domain.method` requests to typed handlers
//! - **Methods** ([`methods`]) - the `Debugger` and `Runtime` domains
//! - **Handler** ([`handler`]) - joins the server to a [`crate::agent::DebugAgent`]
//! - **Types** ([`types`]) - request, response and event envelopes
//! - **Utils** ([`utils`]) - id helpers
//!
//! # Protocol
//!
//! ```text
//! request   {"id": 1, "method": "Debugger.enable", "params": {}}
//! response  {"id": 1, "result": {"debuggerId": "..."}}
//! event     {"method": "Debugger.scriptParsed", "params": {...}}
//! ```
//!
//! Requests that cannot be dispatched (unknown method, bad params, failing
//! handler) are logged and get no response. Lookups that find nothing answer
//! with an empty `result`.

pub mod discovery;
pub mod handler;
pub mod methods;
pub mod router;
pub mod server;
pub mod types;
pub mod utils;

pub use handler::CdpHandler;
pub use router::{CallContext, Domain, Router};
pub use server::{start, RequestHandler, ServerHandle, SessionId};
pub use types::*;
