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

//! `Debugger` domain methods.
//!
//! # Breakpoints
//!
//! Breakpoints are resolved against a script's breakable locations before
//! they reach the engine: a request for a position without a statement moves
//! forward to the next breakable location.
//!
//! - `setBreakpoint` binds one location of one script.
//! - `setBreakpointByUrl` records a pending request that binds every current
//!   and future script matching its URL, URL pattern or content hash.
//!
//! # Example Usage
//!
//! ```json
//! // Request
//! {"id": 4, "method": "Debugger.setBreakpoint",
//!  "params": {"location": {"scriptId": "1", "lineNumber": 3}}}
//!
//! // Response
//! {"id": 4, "result": {"breakpointId": "1",
//!  "actualLocation": {"scriptId": "1", "lineNumber": 4, "columnNumber": 2}}}
//! ```

use cdp_bridge_common::types::{
    EnableResult, Empty, EvaluateOnCallFrameParams, EvaluateOnCallFrameResult,
    GetPossibleBreakpointsParams, GetPossibleBreakpointsResult, GetScriptSourceParams,
    GetScriptSourceResult, NoParams, RemoteObject, RemoveBreakpointParams, ResumeParams,
    SetBreakpointByUrlParams, SetBreakpointByUrlResult, SetBreakpointParams, SetBreakpointResult,
    SetBreakpointsActiveParams,
};
use eyre::Result;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::{
    agent::DebugAgent,
    debuggee::{EvaluationError, ScriptEngine},
    registry::{PendingBreakPoint, ResolvedBreakPoint},
    rpc::router::CallContext,
};

/// Result of evaluating on any frame but the innermost.
pub const NON_TOP_FRAME_EVALUATION: &str = "<evaluation on non-top call frames not supported yet>";

/// Start announcing scripts. Every known script is sent to the requesting
/// connection after the response, including ones another client has already
/// seen.
pub fn enable<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<EnableResult>> {
    agent.set_debugger_enabled(true);
    for source in agent.registry().sources() {
        source.mark_announced();
        cx.defer(&source.script_parsed_event());
    }
    Ok(Some(EnableResult { debugger_id: agent.debugger_id().to_string() }))
}

/// Stop announcing scripts.
pub fn disable<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.set_debugger_enabled(false);
    Ok(Some(Empty {}))
}

/// Full text of a script.
pub fn get_script_source<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: GetScriptSourceParams,
) -> Result<Option<GetScriptSourceResult>> {
    Ok(agent
        .registry()
        .source(&params.script_id)
        .map(|source| GetScriptSourceResult { script_source: source.text().to_string() }))
}

/// Breakable locations between `start` and `end` of one script.
pub fn get_possible_breakpoints<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: GetPossibleBreakpointsParams,
) -> Result<Option<GetPossibleBreakpointsResult>> {
    let GetPossibleBreakpointsParams { start, end, restrict_to_function } = params;
    if let Some(end) = end.as_ref().filter(|end| end.script_id != start.script_id) {
        warn!(start = %start.script_id, end = %end.script_id, "Range spans two scripts");
        return Ok(None);
    }
    if restrict_to_function == Some(true) {
        trace!("restrictToFunction is not supported, returning the whole range");
    }

    let Some(source) = agent.registry().source(&start.script_id) else {
        return Ok(None);
    };
    let locations = source
        .possible_breakpoints(
            (start.line_number, start.column_number.unwrap_or(0)),
            end.map(|end| (end.line_number, end.column_number.unwrap_or(0))),
        )
        .to_vec();
    Ok(Some(GetPossibleBreakpointsResult { locations }))
}

/// Bind a breakpoint at the breakable location nearest to `location`.
pub fn set_breakpoint<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: SetBreakpointParams,
) -> Result<Option<SetBreakpointResult>> {
    let SetBreakpointParams { location, condition } = params;
    let Some(source) = agent.registry().source(&location.script_id) else {
        return Ok(None);
    };
    let Some(target) =
        source.find_nearest_break(location.line_number, location.column_number.unwrap_or(0))
    else {
        debug!(script_id = %location.script_id, "Script has no breakable location");
        return Ok(None);
    };

    let resolved = ResolvedBreakPoint::new(&source, target, condition);
    agent.engine().add_breakpoint(&resolved.breakpoint);
    let actual_location = resolved.location.clone();
    let breakpoint_id = agent.registry().add_breakpoint(resolved);

    debug!(%breakpoint_id, ?actual_location, "Breakpoint set");
    Ok(Some(SetBreakpointResult { breakpoint_id, actual_location }))
}

/// Record a pending breakpoint and bind it to every matching script.
pub fn set_breakpoint_by_url<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: SetBreakpointByUrlParams,
) -> Result<Option<SetBreakpointByUrlResult>> {
    let SetBreakpointByUrlParams { line_number, url, url_regex, script_hash, column_number, condition } =
        params;
    if url.is_none() && url_regex.is_none() && script_hash.is_none() {
        warn!("setBreakpointByUrl without url, urlRegex or scriptHash");
        return Ok(None);
    }

    let mut pending = PendingBreakPoint::new(line_number, column_number.unwrap_or(0), condition);
    if let Some(url) = url {
        pending = pending.with_url(url);
    }
    if let Some(pattern) = url_regex {
        match Regex::new(&pattern) {
            Ok(regex) => pending = pending.with_url_regex(regex),
            Err(err) => {
                warn!(%pattern, %err, "Invalid urlRegex");
                return Ok(None);
            }
        }
    }
    if let Some(hash) = script_hash {
        pending = pending.with_script_hash(hash);
    }

    let (breakpoint_id, bound) = agent.registry().add_pending_breakpoint(pending);
    for resolved in &bound {
        agent.engine().add_breakpoint(&resolved.breakpoint);
    }

    debug!(%breakpoint_id, bound = bound.len(), "Pending breakpoint set");
    Ok(Some(SetBreakpointByUrlResult {
        breakpoint_id,
        locations: bound.into_iter().map(|resolved| resolved.location).collect(),
    }))
}

/// Remove a breakpoint and everything it bound.
pub fn remove_breakpoint<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: RemoveBreakpointParams,
) -> Result<Option<Empty>> {
    let retracted = agent.registry().remove_breakpoint(&params.breakpoint_id);
    for breakpoint in &retracted {
        agent.engine().remove_breakpoint(breakpoint);
    }
    debug!(breakpoint_id = %params.breakpoint_id, retracted = retracted.len(), "Breakpoint removed");
    Ok(Some(Empty {}))
}

/// Enable or disable all breakpoints.
pub fn set_breakpoints_active<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: SetBreakpointsActiveParams,
) -> Result<Option<Empty>> {
    agent.engine().set_breakpoints_active(params.active);
    Ok(Some(Empty {}))
}

/// Halt before the next statement.
pub fn pause<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.coordinator().pause();
    Ok(Some(Empty {}))
}

/// Run until the next breakpoint.
pub fn resume<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: ResumeParams,
) -> Result<Option<Empty>> {
    agent.coordinator().resume();
    Ok(Some(Empty {}))
}

/// Halt before the next statement, entering calls.
pub fn step_into<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.coordinator().step_into();
    Ok(Some(Empty {}))
}

/// Halt at the next statement of the current frame.
pub fn step_over<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.coordinator().step_over();
    Ok(Some(Empty {}))
}

/// Halt after the current function returns.
pub fn step_out<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.coordinator().step_out();
    Ok(Some(Empty {}))
}

/// Evaluate an expression in the paused innermost frame.
///
/// A thrown exception is reported through `exceptionDetails`, with the thrown
/// value as `result`.
pub fn evaluate_on_call_frame<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: EvaluateOnCallFrameParams,
) -> Result<Option<EvaluateOnCallFrameResult>> {
    if !agent.coordinator().is_halted() {
        debug!("evaluateOnCallFrame while running");
        return Ok(None);
    }
    if params.call_frame_id != "0" {
        return Ok(Some(EvaluateOnCallFrameResult {
            result: RemoteObject::string(NON_TOP_FRAME_EVALUATION),
            exception_details: None,
        }));
    }

    let group = params.object_group.as_deref();
    let preview = params.generate_preview.unwrap_or(false);
    let inspector = agent.inspector();
    match agent.engine().evaluate(&params.expression) {
        Ok(value) => Ok(Some(EvaluateOnCallFrameResult {
            result: inspector.remote_object(&value, group, preview),
            exception_details: None,
        })),
        Err(EvaluationError::Thrown(exception)) => {
            debug!(expression = %params.expression, message = %exception.message, "Evaluation threw");
            Ok(Some(EvaluateOnCallFrameResult {
                result: inspector.remote_object(&exception.value, group, preview),
                exception_details: Some(inspector.exception_details(
                    &exception,
                    agent.next_exception_id(),
                    group,
                )),
            }))
        }
        Err(EvaluationError::Internal(message)) => {
            warn!(expression = %params.expression, %message, "Evaluation failed");
            Ok(None)
        }
    }
}
