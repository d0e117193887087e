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

//! The [`RequestHandler`] serving a [`DebugAgent`].

use std::sync::Arc;

use tracing::trace;

use super::{
    discovery::Discovery,
    methods,
    router::Router,
    server::{RequestHandler, SessionId},
    types::Reply,
};
use crate::{agent::DebugAgent, debuggee::ScriptEngine};

/// Connects the transport to a [`DebugAgent`]: discovery documents over HTTP,
/// routed protocol requests over WebSocket.
pub struct CdpHandler<E: ScriptEngine> {
    agent: Arc<DebugAgent<E>>,
    router: Router<DebugAgent<E>>,
    discovery: Discovery,
}

impl<E: ScriptEngine> CdpHandler<E> {
    /// Create a handler serving `agent`.
    pub fn new(agent: Arc<DebugAgent<E>>) -> Self {
        let discovery = Discovery::new(
            agent.config().clone(),
            agent.engine().engine_name(),
            agent.engine().engine_version(),
            agent.debugger_id(),
        );
        Self { agent, router: methods::router(), discovery }
    }
}

impl<E: ScriptEngine> RequestHandler for CdpHandler<E> {
    fn handle_http(&self, path: &str, port: u16) -> Option<String> {
        self.discovery.respond(path, port)
    }

    fn handle_message(&self, session: SessionId, message: &str) -> Option<Reply> {
        trace!(session, message, "Received message");
        self.router.handle(&self.agent, message)
    }
}
