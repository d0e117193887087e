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

//! A scripted engine for driving the bridge without a real interpreter.
//!
//! Scripts are "parsed" line by line: every non-blank line is one statement
//! starting at its first non-whitespace character, and a line holding only
//! `}` closes a function body. Evaluation answers from a table of canned
//! results.

use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use cdp_bridge::{
    AstVisitor, Binding, BreakPoint, DebugInfo, DebugScope, EvaluationError, JsValue, ObjectClass,
    PauseType, PropertyEntry, ScriptAst, ScriptEngine, SourceLocation, SourcePosition, StackFrame,
    ThrownException,
};
use cdp_bridge_common::types::ScopeType;
use parking_lot::Mutex;

struct ObjectData {
    class: ObjectClass,
    constructor: String,
    description: String,
    properties: Mutex<Vec<PropertyEntry<MockObject>>>,
    prototype: Option<MockObject>,
}

/// An engine object. Equality and hashing are by identity.
#[derive(Clone)]
pub struct MockObject(Arc<ObjectData>);

impl MockObject {
    /// A plain object with the given constructor name and no properties.
    pub fn plain(constructor: &str) -> Self {
        Self::new(ObjectClass::Plain, constructor, constructor, None)
    }

    /// An object of any class.
    pub fn new(
        class: ObjectClass,
        constructor: &str,
        description: &str,
        prototype: Option<Self>,
    ) -> Self {
        Self(Arc::new(ObjectData {
            class,
            constructor: constructor.to_string(),
            description: description.to_string(),
            properties: Mutex::new(Vec::new()),
            prototype,
        }))
    }

    /// Add a data property.
    pub fn with_property(self, name: &str, value: JsValue<Self>) -> Self {
        self.0.properties.lock().push(PropertyEntry::data(name, value));
        self
    }

    /// Add an accessor property.
    pub fn with_accessor(self, name: &str, getter: Self) -> Self {
        self.0.properties.lock().push(PropertyEntry::accessor(name, Some(getter), None));
        self
    }
}

impl PartialEq for MockObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MockObject {}

impl Hash for MockObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for MockObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockObject({}@{:p})", self.0.description, Arc::as_ptr(&self.0))
    }
}

/// Line-based stand-in for a parsed script.
#[derive(Debug, Clone, Default)]
pub struct MockAst {
    statements: Vec<SourcePosition>,
    body_ends: Vec<SourcePosition>,
}

impl MockAst {
    /// "Parse" `text`.
    pub fn parse(text: &str) -> Self {
        let mut ast = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line_number = index as u32 + 1;
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                continue;
            }
            let column = (line.len() - trimmed.len()) as u32;
            if trimmed.trim_end() == "}" {
                ast.body_ends.push(SourcePosition::new(line_number, column));
            } else {
                ast.statements.push(SourcePosition::new(line_number, column));
            }
        }
        ast
    }
}

impl ScriptAst for MockAst {
    fn walk(&self, visitor: &mut dyn AstVisitor) {
        for start in &self.statements {
            visitor.statement(*start);
        }
        for end in &self.body_ends {
            visitor.function_body_end(*end);
        }
    }
}

/// Scripted engine.
#[derive(Default)]
pub struct MockEngine {
    results: Mutex<HashMap<String, Result<JsValue<MockObject>, String>>>,
    breakpoints: Mutex<Vec<BreakPoint>>,
    breakpoints_inactive: AtomicBool,
}

impl MockEngine {
    /// Create an engine with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `expression` evaluate to `value`.
    pub fn on_evaluate(&self, expression: &str, value: JsValue<MockObject>) {
        self.results.lock().insert(expression.to_string(), Ok(value));
    }

    /// Make `expression` throw an error with `message`.
    pub fn on_evaluate_throw(&self, expression: &str, message: &str) {
        self.results.lock().insert(expression.to_string(), Err(message.to_string()));
    }

    /// The engine's current breakpoint set.
    pub fn breakpoints(&self) -> Vec<BreakPoint> {
        self.breakpoints.lock().clone()
    }

    /// Whether breakpoints are enabled.
    pub fn breakpoints_active(&self) -> bool {
        !self.breakpoints_inactive.load(Ordering::SeqCst)
    }
}

impl ScriptEngine for MockEngine {
    type Object = MockObject;

    fn engine_name(&self) -> &str {
        "Mock"
    }

    fn engine_version(&self) -> &str {
        "1.0.0"
    }

    fn evaluate(
        &self,
        expression: &str,
    ) -> Result<JsValue<MockObject>, EvaluationError<MockObject>> {
        match self.results.lock().get(expression) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => {
                let error = MockObject::new(ObjectClass::Error, "Error", message, None)
                    .with_property("message", JsValue::String(message.clone()));
                Err(EvaluationError::Thrown(ThrownException {
                    message: format!("Uncaught Error: {message}"),
                    location: None,
                    value: JsValue::Object(error),
                }))
            }
            None => Err(EvaluationError::Internal(format!("no result scripted for `{expression}`"))),
        }
    }

    fn own_properties(&self, object: &MockObject) -> Vec<PropertyEntry<MockObject>> {
        object.0.properties.lock().clone()
    }

    fn prototype(&self, object: &MockObject) -> Option<MockObject> {
        object.0.prototype.clone()
    }

    fn constructor_name(&self, object: &MockObject) -> Option<String> {
        Some(object.0.constructor.clone())
    }

    fn classify(&self, object: &MockObject) -> ObjectClass {
        object.0.class
    }

    fn describe(&self, object: &MockObject) -> String {
        object.0.description.clone()
    }

    fn add_breakpoint(&self, breakpoint: &BreakPoint) {
        let mut breakpoints = self.breakpoints.lock();
        if !breakpoints.contains(breakpoint) {
            breakpoints.push(breakpoint.clone());
        }
    }

    fn remove_breakpoint(&self, breakpoint: &BreakPoint) {
        self.breakpoints.lock().retain(|bp| bp != breakpoint);
    }

    fn set_breakpoints_active(&self, active: bool) {
        self.breakpoints_inactive.store(!active, Ordering::SeqCst);
    }
}

/// A top-level frame at `line`/`column` (engine coordinates) of script
/// `key`, with one local scope holding `bindings`.
pub fn frame(
    key: &str,
    line: u32,
    column: u32,
    bindings: Vec<(&str, JsValue<MockObject>)>,
) -> StackFrame<MockObject> {
    StackFrame {
        function_name: String::new(),
        location: SourceLocation::new(key, SourcePosition::new(line, column)),
        function_location: None,
        scope_chain: vec![DebugScope {
            kind: ScopeType::Local,
            name: None,
            binding_object: None,
            bindings: bindings
                .into_iter()
                .map(|(name, value)| Binding { name: name.to_string(), value: Some(value) })
                .collect(),
        }],
        this: JsValue::Undefined,
        return_value: None,
    }
}

/// Hook payload for a halt in `frames`.
pub fn debug_info(
    pause_type: PauseType,
    frames: Vec<StackFrame<MockObject>>,
) -> DebugInfo<MockObject> {
    DebugInfo { pause_type, call_stack: frames }
}
