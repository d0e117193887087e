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

//! The debug agent: one debugged engine and everything attached to it.
//!
//! A host embeds the bridge by creating a [`DebugAgent`], starting the server
//! with [`DebugAgent::serve`] and forwarding the engine's hooks:
//!
//! - [`DebugAgent::on_parsed`] after a script is compiled
//! - [`DebugAgent::on_step`] before statements while stepping is requested
//! - [`DebugAgent::on_break`] when a breakpoint or `debugger;` statement is hit
//!
//! The step and break hooks may block the calling thread until a client
//! resumes, so they must be called from the engine's own thread, never from a
//! tokio worker.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use cdp_bridge_common::types::{BreakpointResolvedEvent, PausedEvent, ResumedEvent};
use eyre::{eyre, Result};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::{
    config::BridgeConfig,
    coordinator::{DebugCoordinator, DebugNotification},
    debuggee::{DebugInfo, ScriptAst, ScriptEngine, StepMode},
    inspect::{Inspector, BACKTRACE_GROUP},
    registry::RuntimeRegistry,
    rpc::{
        handler::CdpHandler,
        server::{self, ServerHandle},
        types::{EventSink, EventStream},
        utils::new_debugger_id,
    },
};

/// Bridge state for one debugged engine.
pub struct DebugAgent<E: ScriptEngine> {
    config: BridgeConfig,
    engine: Arc<E>,
    registry: Arc<RuntimeRegistry<E::Object>>,
    coordinator: DebugCoordinator<E::Object>,
    inspector: Inspector<E>,
    events: EventSink,
    /// Taken by the first `serve`
    event_stream: Mutex<Option<EventStream>>,
    debugger_id: String,
    debugger_enabled: AtomicBool,
    runtime_enabled: AtomicBool,
    /// Whether `Runtime.runIfWaitingForDebugger` was received
    released: Mutex<bool>,
    release_signal: Condvar,
    next_exception_id: AtomicU32,
}

impl<E: ScriptEngine> DebugAgent<E> {
    /// Create an agent for `engine`.
    pub fn new(engine: Arc<E>, config: BridgeConfig) -> Arc<Self> {
        let registry = Arc::new(RuntimeRegistry::new());
        let inspector = Inspector::new(engine.clone(), registry.clone());
        let (events, event_stream) = EventSink::channel();

        let listener = {
            let inspector = inspector.clone();
            let registry = registry.clone();
            let events = events.clone();
            Box::new(move |notification: DebugNotification<E::Object>| match notification {
                DebugNotification::Paused { info, reason } => {
                    let hit_breakpoints = info
                        .current_location()
                        .map(|at| {
                            registry.breakpoints_at(&at.source_key, at.position.line, at.position.column)
                        })
                        .unwrap_or_default();
                    events.emit(&PausedEvent {
                        call_frames: inspector.call_frames(&info),
                        reason,
                        hit_breakpoints,
                    });
                }
                DebugNotification::Resumed => {
                    let released = registry.release_object_group(BACKTRACE_GROUP);
                    debug!(released, "Released paused-state objects");
                    events.emit(&ResumedEvent {});
                }
            })
        };

        Arc::new(Self {
            coordinator: DebugCoordinator::new(config.pause_on_start, listener),
            config,
            engine,
            registry,
            inspector,
            events,
            event_stream: Mutex::new(Some(event_stream)),
            debugger_id: new_debugger_id(),
            debugger_enabled: AtomicBool::new(false),
            runtime_enabled: AtomicBool::new(false),
            released: Mutex::new(false),
            release_signal: Condvar::new(),
            next_exception_id: AtomicU32::new(1),
        })
    }

    /// Start the discovery and WebSocket server. Can be called once.
    pub async fn serve(self: &Arc<Self>) -> Result<ServerHandle> {
        let events =
            self.event_stream.lock().take().ok_or_else(|| eyre!("Debug agent is already serving"))?;
        let handler = Arc::new(CdpHandler::new(self.clone()));
        let handle = server::start(&self.config, handler, events).await?;
        info!(url = %self.config.bound_to(handle.port()).devtools_frontend_url(), "Debugger available");
        Ok(handle)
    }

    /// Configuration the agent was created with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The debugged engine
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Sources, breakpoints and object ids
    pub fn registry(&self) -> &RuntimeRegistry<E::Object> {
        &self.registry
    }

    /// Engine thread synchronization
    pub fn coordinator(&self) -> &DebugCoordinator<E::Object> {
        &self.coordinator
    }

    /// Remote object construction
    pub fn inspector(&self) -> &Inspector<E> {
        &self.inspector
    }

    /// Id reported by `Debugger.enable` and used as the discovery target id
    pub fn debugger_id(&self) -> &str {
        &self.debugger_id
    }

    /// Start or stop announcing scripts as they are parsed.
    pub fn set_debugger_enabled(&self, enabled: bool) {
        self.debugger_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether `Debugger.enable` is in effect
    pub fn is_debugger_enabled(&self) -> bool {
        self.debugger_enabled.load(Ordering::SeqCst)
    }

    /// Record `Runtime.enable`/`Runtime.disable`.
    pub fn set_runtime_enabled(&self, enabled: bool) {
        self.runtime_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether `Runtime.enable` is in effect
    pub fn is_runtime_enabled(&self) -> bool {
        self.runtime_enabled.load(Ordering::SeqCst)
    }

    /// Id for the next reported exception.
    pub fn next_exception_id(&self) -> u32 {
        self.next_exception_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Release hosts blocked in [`Self::wait_for_debugger`].
    pub fn run_if_waiting(&self) {
        *self.released.lock() = true;
        self.release_signal.notify_all();
    }

    /// Block until a client sends `Runtime.runIfWaitingForDebugger`, or until
    /// `timeout` elapses. Returns whether the client released the host.
    pub fn wait_for_debugger(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut released = self.released.lock();
        while !*released {
            match deadline {
                Some(deadline) => {
                    if self.release_signal.wait_until(&mut released, deadline).timed_out() {
                        break;
                    }
                }
                None => self.release_signal.wait(&mut released),
            }
        }
        *released
    }

    /// Register a compiled script, announce it and bind pending breakpoints.
    ///
    /// `key` identifies the script to the engine; `url` is what clients see.
    /// Re-registering a key is a no-op.
    pub fn on_parsed(&self, key: &str, url: &str, text: &str, ast: Arc<dyn ScriptAst>) {
        let added = self.registry.add_source(key, url, text, ast);
        if !added.is_new {
            return;
        }
        let source = added.source;

        if self.is_debugger_enabled() && source.mark_announced() {
            self.events.emit(&source.script_parsed_event());
        }

        for (breakpoint_id, resolved) in self.registry.bind_pending(&source) {
            self.engine.add_breakpoint(&resolved.breakpoint);
            self.events.emit(&BreakpointResolvedEvent { breakpoint_id, location: resolved.location });
        }
    }

    /// Step hook. See [`DebugCoordinator::on_step`].
    pub fn on_step(&self, info: DebugInfo<E::Object>) -> StepMode {
        self.coordinator.on_step(info)
    }

    /// Breakpoint hook. See [`DebugCoordinator::on_break`].
    pub fn on_break(&self, info: DebugInfo<E::Object>) -> StepMode {
        self.coordinator.on_break(info)
    }

    /// Stop halting: hooks return immediately from now on.
    pub fn detach(&self) {
        self.coordinator.detach();
        self.run_if_waiting();
    }
}
