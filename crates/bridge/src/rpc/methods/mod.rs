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

//! Protocol method handlers, organized by domain.
//!
//! # Available Domains
//!
//! - **Debugger** ([`debugger`]) - script sources, breakpoints, execution
//!   control and evaluation in the paused frame
//! - **Runtime** ([`runtime`]) - remote object inspection and release

pub mod debugger;
pub mod runtime;

use super::router::{Domain, Router};
use crate::{agent::DebugAgent, debuggee::ScriptEngine};

/// The dispatch table of every supported method.
pub fn router<E: ScriptEngine>() -> Router<DebugAgent<E>> {
    Router::new()
        .domain(
            Domain::new("Debugger")
                .method("enable", debugger::enable::<E>)
                .method("disable", debugger::disable::<E>)
                .method("getScriptSource", debugger::get_script_source::<E>)
                .method("getPossibleBreakpoints", debugger::get_possible_breakpoints::<E>)
                .method("setBreakpoint", debugger::set_breakpoint::<E>)
                .method("setBreakpointByUrl", debugger::set_breakpoint_by_url::<E>)
                .method("removeBreakpoint", debugger::remove_breakpoint::<E>)
                .method("setBreakpointsActive", debugger::set_breakpoints_active::<E>)
                .method("pause", debugger::pause::<E>)
                .method("resume", debugger::resume::<E>)
                .method("stepInto", debugger::step_into::<E>)
                .method("stepOver", debugger::step_over::<E>)
                .method("stepOut", debugger::step_out::<E>)
                .method("evaluateOnCallFrame", debugger::evaluate_on_call_frame::<E>),
        )
        .domain(
            Domain::new("Runtime")
                .method("enable", runtime::enable::<E>)
                .method("disable", runtime::disable::<E>)
                .method("getProperties", runtime::get_properties::<E>)
                .method("releaseObject", runtime::release_object::<E>)
                .method("releaseObjectGroup", runtime::release_object_group::<E>)
                .method("runIfWaitingForDebugger", runtime::run_if_waiting_for_debugger::<E>),
        )
}
