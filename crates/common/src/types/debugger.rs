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

use serde::{Deserialize, Serialize};

use super::{CdpEvent, ExceptionDetails, RemoteObject, ScriptId};

/// Breakpoint identifier, shared by concrete and URL-based breakpoints.
pub type BreakpointId = String;

/// Call frame identifier; the frame's index in the paused call stack.
pub type CallFrameId = String;

/// Location in a script, zero-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Script the location belongs to
    pub script_id: ScriptId,
    /// Line number
    pub line_number: u32,
    /// Column number, `0` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

/// Kind of a breakable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakLocationType {
    /// `debugger;` statement
    DebuggerStatement,
    /// Call site
    Call,
    /// End of a function body
    Return,
}

/// A location where execution may pause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakLocation {
    /// Script the location belongs to
    pub script_id: ScriptId,
    /// Line number
    pub line_number: u32,
    /// Column number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    /// Location kind; plain statement starts carry none
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BreakLocationType>,
}

impl From<BreakLocation> for Location {
    fn from(location: BreakLocation) -> Self {
        Self {
            script_id: location.script_id,
            line_number: location.line_number,
            column_number: location.column_number,
        }
    }
}

/// Scope kind reported in a call frame's scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// Global scope
    Global,
    /// Function-local scope
    Local,
    /// `with` statement scope
    With,
    /// Closure scope
    Closure,
    /// `catch` clause scope
    Catch,
    /// Block scope
    Block,
    /// Top-level lexical scope of a script
    Script,
    /// `eval` scope
    Eval,
    /// Module scope
    Module,
}

/// One entry of a call frame's scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope kind
    #[serde(rename = "type")]
    pub kind: ScopeType,
    /// Object holding the scope's variables
    pub object: RemoteObject,
    /// Scope name, for function scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A frame of the paused call stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// Frame identifier usable with `Debugger.evaluateOnCallFrame`
    pub call_frame_id: CallFrameId,
    /// Name of the executing function
    pub function_name: String,
    /// Location of the function's definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_location: Option<Location>,
    /// Current execution location
    pub location: Location,
    /// URL of the script
    pub url: String,
    /// Scopes from innermost to outermost
    pub scope_chain: Vec<Scope>,
    /// `this` binding
    pub this: RemoteObject,
    /// Value about to be returned, at a function's return location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<RemoteObject>,
}

/// Reason reported with `Debugger.paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Paused following a `Debugger.pause` request
    #[serde(rename = "debugCommand")]
    DebugCommand,
    /// Any other reason: breakpoint, step or `debugger;` statement
    #[serde(rename = "other")]
    Other,
}

/// `Debugger.paused` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    /// Call stack, innermost frame first
    pub call_frames: Vec<CallFrame>,
    /// Pause reason
    pub reason: PauseReason,
    /// Breakpoints at the pause location
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hit_breakpoints: Vec<BreakpointId>,
}

impl CdpEvent for PausedEvent {
    const METHOD: &'static str = "Debugger.paused";
}

/// `Debugger.resumed` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumedEvent {}

impl CdpEvent for ResumedEvent {
    const METHOD: &'static str = "Debugger.resumed";
}

/// `Debugger.scriptParsed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    /// Protocol script id
    pub script_id: ScriptId,
    /// Script URL
    pub url: String,
    /// First line, always `0`
    pub start_line: u32,
    /// First column, always `0`
    pub start_column: u32,
    /// Last line
    pub end_line: u32,
    /// Length of the last line
    pub end_column: u32,
    /// Execution context the script runs in
    pub execution_context_id: u32,
    /// Content hash
    pub hash: String,
    /// Whether the script was live-edited
    pub is_live_edit: bool,
    /// Source map URL, empty when none
    #[serde(rename = "sourceMapURL")]
    pub source_map_url: String,
    /// Whether the script has a `//# sourceURL` comment
    #[serde(rename = "hasSourceURL")]
    pub has_source_url: bool,
    /// Whether the script is an ES module
    pub is_module: bool,
    /// Length in UTF-16 code units
    pub length: u32,
    /// Script language
    pub script_language: String,
}

impl CdpEvent for ScriptParsedEvent {
    const METHOD: &'static str = "Debugger.scriptParsed";
}

/// `Debugger.breakpointResolved` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResolvedEvent {
    /// Breakpoint that got a new location
    pub breakpoint_id: BreakpointId,
    /// The new location
    pub location: Location,
}

impl CdpEvent for BreakpointResolvedEvent {
    const METHOD: &'static str = "Debugger.breakpointResolved";
}

/// Result of `Debugger.enable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableResult {
    /// Unique identifier of the debugger
    pub debugger_id: String,
}

/// Parameters of `Debugger.getScriptSource`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceParams {
    /// Script to fetch
    pub script_id: ScriptId,
}

/// Result of `Debugger.getScriptSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceResult {
    /// Full script text
    pub script_source: String,
}

/// Parameters of `Debugger.getPossibleBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPossibleBreakpointsParams {
    /// Start of the range, inclusive
    pub start: Location,
    /// End of the range; the end of the script when absent
    #[serde(default)]
    pub end: Option<Location>,
    /// Only report locations of the function containing `start`
    #[serde(default)]
    pub restrict_to_function: Option<bool>,
}

/// Result of `Debugger.getPossibleBreakpoints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPossibleBreakpointsResult {
    /// Breakable locations in the range
    pub locations: Vec<BreakLocation>,
}

/// Parameters of `Debugger.setBreakpoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointParams {
    /// Requested location
    pub location: Location,
    /// Expression that must be truthy for the breakpoint to pause
    #[serde(default)]
    pub condition: Option<String>,
}

/// Result of `Debugger.setBreakpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointResult {
    /// Breakpoint id
    pub breakpoint_id: BreakpointId,
    /// Location the breakpoint was resolved to
    pub actual_location: Location,
}

/// Parameters of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    /// Requested line
    pub line_number: u32,
    /// Exact URL to match
    #[serde(default)]
    pub url: Option<String>,
    /// URL pattern to match
    #[serde(default)]
    pub url_regex: Option<String>,
    /// Script content hash to match
    #[serde(default)]
    pub script_hash: Option<String>,
    /// Requested column
    #[serde(default)]
    pub column_number: Option<u32>,
    /// Expression that must be truthy for the breakpoint to pause
    #[serde(default)]
    pub condition: Option<String>,
}

/// Result of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    /// Breakpoint id
    pub breakpoint_id: BreakpointId,
    /// Locations resolved in already parsed scripts
    pub locations: Vec<Location>,
}

/// Parameters of `Debugger.removeBreakpoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointParams {
    /// Breakpoint to remove
    pub breakpoint_id: BreakpointId,
}

/// Parameters of `Debugger.setBreakpointsActive`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetBreakpointsActiveParams {
    /// New state
    pub active: bool,
}

/// Parameters of `Debugger.resume`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeParams {
    /// Accepted for compatibility; termination is not supported
    #[serde(default)]
    pub terminate_on_resume: Option<bool>,
}

/// Parameters of `Debugger.evaluateOnCallFrame`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameParams {
    /// Frame to evaluate in
    pub call_frame_id: CallFrameId,
    /// Expression to evaluate
    pub expression: String,
    /// Group the result object is registered under
    #[serde(default)]
    pub object_group: Option<String>,
    /// Suppress exception reporting side effects
    #[serde(default)]
    pub silent: Option<bool>,
    /// Return the result as a JSON value
    #[serde(default)]
    pub return_by_value: Option<bool>,
    /// Include a preview of object results
    #[serde(default)]
    pub generate_preview: Option<bool>,
}

/// Result of `Debugger.evaluateOnCallFrame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameResult {
    /// Evaluation result, or the thrown value
    pub result: RemoteObject,
    /// Set when the evaluation threw
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,
}
