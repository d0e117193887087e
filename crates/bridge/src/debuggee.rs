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

//! The contract between the bridge and the script engine being debugged.
//!
//! The bridge never parses or executes script itself. An engine integration
//! implements [`ScriptEngine`] for object inspection, evaluation and its
//! breakpoint set, and [`ScriptAst`] for each parsed script. In the other
//! direction the engine calls the hooks on
//! [`DebugAgent`](crate::agent::DebugAgent): `on_parsed` for every new script,
//! `on_step` before every statement and `on_break` at breakpoints.
//!
//! # Coordinates
//!
//! Engine positions ([`SourcePosition`]) use 1-based lines and 0-based
//! columns. The bridge converts to the protocol's 0-based lines at the
//! boundary; nothing on this side of the trait speaks protocol coordinates.

use std::{fmt, hash::Hash};

use cdp_bridge_common::types::ScopeType;

/// A position in engine coordinates: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

impl SourcePosition {
    /// Create a new position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A position inside a particular script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Engine-side source key, as passed to `on_parsed`
    pub source_key: String,
    /// Position within the script
    pub position: SourcePosition,
}

impl SourceLocation {
    /// Create a new location
    pub fn new(source_key: impl Into<String>, position: SourcePosition) -> Self {
        Self { source_key: source_key.into(), position }
    }
}

/// Receives the breakable positions of a script during [`ScriptAst::walk`].
pub trait AstVisitor {
    /// Called with the start of every statement.
    fn statement(&mut self, start: SourcePosition);

    /// Called with the end of every function and arrow function body.
    fn function_body_end(&mut self, end: SourcePosition);
}

/// A parsed script, as far as the bridge needs to see it.
pub trait ScriptAst: Send + Sync {
    /// Walk the whole tree once, reporting statements and function bodies.
    fn walk(&self, visitor: &mut dyn AstVisitor);
}

/// A script value as seen by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue<O> {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Boolean(bool),
    /// Number primitive
    Number(f64),
    /// String primitive
    String(String),
    /// BigInt primitive, as decimal digits without the `n` suffix
    BigInt(String),
    /// Symbol primitive, with its description (e.g. `Symbol(foo)`)
    Symbol(String),
    /// Reference to an engine object
    Object(O),
}

/// Classification of an engine object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    /// Ordinary object
    Plain,
    /// Callable object
    Function,
    /// Array
    Array,
    /// Regular expression
    RegExp,
    /// Date
    Date,
    /// Map
    Map,
    /// Set
    Set,
    /// WeakMap
    WeakMap,
    /// WeakSet
    WeakSet,
    /// Error
    Error,
    /// Proxy
    Proxy,
    /// Promise
    Promise,
    /// Typed array
    TypedArray,
}

/// An own property of an engine object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry<O> {
    /// Property name (symbols rendered as their description)
    pub name: String,
    /// Value, for data properties
    pub value: Option<JsValue<O>>,
    /// Getter function, for accessor properties
    pub getter: Option<O>,
    /// Setter function, for accessor properties
    pub setter: Option<O>,
    /// `[[Writable]]`
    pub writable: bool,
    /// `[[Enumerable]]`
    pub enumerable: bool,
    /// `[[Configurable]]`
    pub configurable: bool,
}

impl<O> PropertyEntry<O> {
    /// A writable, enumerable, configurable data property.
    pub fn data(name: impl Into<String>, value: JsValue<O>) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            getter: None,
            setter: None,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// An enumerable, configurable accessor property.
    pub fn accessor(name: impl Into<String>, getter: Option<O>, setter: Option<O>) -> Self {
        Self {
            name: name.into(),
            value: None,
            getter,
            setter,
            writable: false,
            enumerable: true,
            configurable: true,
        }
    }

    /// Whether the property has a getter or a setter.
    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

/// A named binding in a scope. `value` is `None` while the binding is in its
/// temporal dead zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<O> {
    /// Binding name
    pub name: String,
    /// Current value
    pub value: Option<JsValue<O>>,
}

/// One scope of a stack frame's scope chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugScope<O> {
    /// Scope kind
    pub kind: ScopeType,
    /// Scope name, if the engine has one (e.g. the function name)
    pub name: Option<String>,
    /// Object backing the scope (global and `with` scopes)
    pub binding_object: Option<O>,
    /// Bindings of declarative scopes
    pub bindings: Vec<Binding<O>>,
}

/// One frame of the engine's call stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame<O> {
    /// Function name, empty for top-level code
    pub function_name: String,
    /// Current location
    pub location: SourceLocation,
    /// Start of the function's definition
    pub function_location: Option<SourceLocation>,
    /// Scopes from innermost to outermost
    pub scope_chain: Vec<DebugScope<O>>,
    /// `this` binding
    pub this: JsValue<O>,
    /// Return value, when halted at a function's return location
    pub return_value: Option<JsValue<O>>,
}

/// Why the engine invoked a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseType {
    /// Single-step hook before a statement
    Step,
    /// Breakpoint hit
    Breakpoint,
    /// `debugger;` statement
    DebuggerStatement,
}

/// Snapshot of engine state handed to `on_step`/`on_break`.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo<O> {
    /// Hook kind
    pub pause_type: PauseType,
    /// Call stack, innermost frame first
    pub call_stack: Vec<StackFrame<O>>,
}

impl<O> DebugInfo<O> {
    /// Location of the innermost frame.
    pub fn current_location(&self) -> Option<&SourceLocation> {
        self.call_stack.first().map(|frame| &frame.location)
    }
}

/// How far the engine should run before calling the step hook again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StepMode {
    /// Do not call the step hook
    None,
    /// Call the step hook before the next statement
    #[default]
    Into,
    /// Call the step hook at the next statement of the current or an outer frame
    Over,
    /// Call the step hook at the next statement of an outer frame
    Out,
}

/// A breakpoint in the engine's own breakpoint set, in engine coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakPoint {
    /// Source key of the script
    pub source_key: String,
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
    /// Condition expression
    pub condition: Option<String>,
}

impl fmt::Display for BreakPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_key, self.line, self.column)?;
        if let Some(condition) = &self.condition {
            write!(f, " if {condition}")?;
        }
        Ok(())
    }
}

/// A script exception thrown out of [`ScriptEngine::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ThrownException<O> {
    /// Error message
    pub message: String,
    /// Throw site, if known
    pub location: Option<SourceLocation>,
    /// The thrown value
    pub value: JsValue<O>,
}

/// Failure of [`ScriptEngine::evaluate`].
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError<O: fmt::Debug> {
    /// The expression threw
    #[error("uncaught exception: {}", .0.message)]
    Thrown(ThrownException<O>),
    /// The engine could not evaluate at all (e.g. not halted)
    #[error("evaluation failed: {0}")]
    Internal(String),
}

/// Services the bridge needs from the engine.
///
/// `Object` must compare and hash by *identity*: two distinct objects with
/// equal contents are different keys.
///
/// Methods are called from protocol threads while the engine thread is halted
/// inside `on_step`/`on_break`, and from the engine thread itself while it
/// builds the paused notification.
pub trait ScriptEngine: Send + Sync + 'static {
    /// Engine object reference
    type Object: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static;

    /// Engine name, used for the `<name>-Version` discovery field.
    fn engine_name(&self) -> &str;

    /// Engine version.
    fn engine_version(&self) -> &str;

    /// Evaluate `expression` in the top frame of the halted engine.
    fn evaluate(
        &self,
        expression: &str,
    ) -> Result<JsValue<Self::Object>, EvaluationError<Self::Object>>;

    /// Own properties of `object`, in definition order.
    fn own_properties(&self, object: &Self::Object) -> Vec<PropertyEntry<Self::Object>>;

    /// `[[Prototype]]` of `object`.
    fn prototype(&self, object: &Self::Object) -> Option<Self::Object>;

    /// Name of the constructor of `object`.
    fn constructor_name(&self, object: &Self::Object) -> Option<String>;

    /// Classify `object`.
    fn classify(&self, object: &Self::Object) -> ObjectClass;

    /// Short human readable description (e.g. `Array(3)`, `function f()`).
    fn describe(&self, object: &Self::Object) -> String;

    /// Add a breakpoint to the engine's breakpoint set.
    fn add_breakpoint(&self, breakpoint: &BreakPoint);

    /// Remove a breakpoint from the engine's breakpoint set.
    fn remove_breakpoint(&self, breakpoint: &BreakPoint);

    /// Enable or disable all breakpoints.
    fn set_breakpoints_active(&self, active: bool);
}
