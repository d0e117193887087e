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

//! Translation of engine values and stack frames into protocol mirrors.
//!
//! Every object handed to a client gets a remote object id from the
//! registry, under the object group of the request that produced it. Objects
//! reachable from a paused call stack are registered under
//! [`BACKTRACE_GROUP`], which is released when the engine resumes.

use std::{collections::HashSet, sync::Arc};

use cdp_bridge_common::types::{
    CallFrame, ExceptionDetails, GetPropertiesResult, InternalPropertyDescriptor, Location,
    ObjectPreview, PropertyDescriptor, PropertyPreview, PropertyPreviewType, RemoteObject,
    RemoteObjectSubtype, RemoteObjectType, Scope,
};
use serde_json::Value;

use crate::{
    debuggee::{
        DebugInfo, DebugScope, JsValue, ObjectClass, PropertyEntry, ScriptEngine, SourceLocation,
        StackFrame, ThrownException,
    },
    registry::{ObjectRecord, ObjectTarget, RuntimeRegistry},
};

/// Object group of everything reachable from the paused call stack.
pub const BACKTRACE_GROUP: &str = "backtrace";

/// Maximum number of properties in an [`ObjectPreview`].
pub const PREVIEW_PROPERTIES: usize = 5;

/// Largest integer magnitude sent as a JSON integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Builds protocol mirrors of engine state.
pub struct Inspector<E: ScriptEngine> {
    engine: Arc<E>,
    registry: Arc<RuntimeRegistry<E::Object>>,
}

impl<E: ScriptEngine> Clone for Inspector<E> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone(), registry: self.registry.clone() }
    }
}

impl<E: ScriptEngine> Inspector<E> {
    /// Create an inspector over `engine`, registering objects in `registry`.
    pub fn new(engine: Arc<E>, registry: Arc<RuntimeRegistry<E::Object>>) -> Self {
        Self { engine, registry }
    }

    /// Mirror of `value`. Objects are registered under `group`.
    pub fn remote_object(
        &self,
        value: &JsValue<E::Object>,
        group: Option<&str>,
        preview: bool,
    ) -> RemoteObject {
        match value {
            JsValue::Undefined => RemoteObject::new(RemoteObjectType::Undefined),
            JsValue::Null => RemoteObject {
                subtype: Some(RemoteObjectSubtype::Null),
                value: Some(Value::Null),
                ..RemoteObject::new(RemoteObjectType::Object)
            },
            JsValue::Boolean(b) => RemoteObject {
                value: Some(Value::Bool(*b)),
                description: Some(b.to_string()),
                ..RemoteObject::new(RemoteObjectType::Boolean)
            },
            JsValue::Number(n) => number_object(*n),
            JsValue::String(s) => RemoteObject::string(s.as_str()),
            JsValue::BigInt(digits) => RemoteObject {
                unserializable_value: Some(format!("{digits}n")),
                description: Some(format!("{digits}n")),
                ..RemoteObject::new(RemoteObjectType::Bigint)
            },
            JsValue::Symbol(description) => RemoteObject {
                description: Some(description.clone()),
                ..RemoteObject::new(RemoteObjectType::Symbol)
            },
            JsValue::Object(object) => self.object(object, group, preview),
        }
    }

    fn object(&self, object: &E::Object, group: Option<&str>, preview: bool) -> RemoteObject {
        let (kind, subtype) = classify(self.engine.classify(object));
        let description = self.engine.describe(object);
        let id = self.registry.get_or_assign_object_id(object, group);

        RemoteObject {
            subtype,
            class_name: self.engine.constructor_name(object),
            preview: preview.then(|| self.preview(object, kind, subtype, &description)),
            description: Some(description),
            object_id: Some(id.to_string()),
            ..RemoteObject::new(kind)
        }
    }

    fn preview(
        &self,
        object: &E::Object,
        kind: RemoteObjectType,
        subtype: Option<RemoteObjectSubtype>,
        description: &str,
    ) -> ObjectPreview {
        let properties = self.engine.own_properties(object);
        ObjectPreview {
            kind,
            subtype,
            description: Some(description.to_string()),
            overflow: properties.len() > PREVIEW_PROPERTIES,
            properties: properties
                .iter()
                .take(PREVIEW_PROPERTIES)
                .map(|property| self.property_preview(property))
                .collect(),
        }
    }

    fn property_preview(&self, property: &PropertyEntry<E::Object>) -> PropertyPreview {
        let name = property.name.clone();
        let Some(value) = property.value.as_ref().filter(|_| !property.is_accessor()) else {
            return PropertyPreview { name, kind: PropertyPreviewType::Accessor, value: None, subtype: None };
        };

        match value {
            JsValue::Object(object) => {
                let (kind, subtype) = classify(self.engine.classify(object));
                PropertyPreview {
                    name,
                    kind: kind.into(),
                    value: Some(self.engine.describe(object)),
                    subtype,
                }
            }
            primitive => {
                let mirror = self.remote_object(primitive, None, false);
                PropertyPreview {
                    name,
                    kind: mirror.kind.into(),
                    value: mirror.description,
                    subtype: mirror.subtype,
                }
            }
        }
    }

    /// Protocol location of an engine location. Scripts the registry does not
    /// know keep their source key as script id.
    pub fn location(&self, location: &SourceLocation) -> Location {
        let script_id = self
            .registry
            .source_by_key(&location.source_key)
            .map(|source| source.script_id().to_string())
            .unwrap_or_else(|| location.source_key.clone());

        Location {
            script_id,
            line_number: location.position.line.saturating_sub(1),
            column_number: Some(location.position.column),
        }
    }

    /// Protocol call frames of a halt, innermost first.
    pub fn call_frames(&self, info: &DebugInfo<E::Object>) -> Vec<CallFrame> {
        info.call_stack.iter().enumerate().map(|(index, frame)| self.call_frame(index, frame)).collect()
    }

    fn call_frame(&self, index: usize, frame: &StackFrame<E::Object>) -> CallFrame {
        let group = Some(BACKTRACE_GROUP);
        let url = self
            .registry
            .source_by_key(&frame.location.source_key)
            .map(|source| source.url().to_string())
            .unwrap_or_default();

        CallFrame {
            call_frame_id: index.to_string(),
            function_name: frame.function_name.clone(),
            function_location: frame.function_location.as_ref().map(|l| self.location(l)),
            location: self.location(&frame.location),
            url,
            scope_chain: frame.scope_chain.iter().map(|scope| self.scope(scope, group)).collect(),
            this: self.remote_object(&frame.this, group, false),
            return_value: frame.return_value.as_ref().map(|v| self.remote_object(v, group, false)),
        }
    }

    fn scope(&self, scope: &DebugScope<E::Object>, group: Option<&str>) -> Scope {
        let id = match &scope.binding_object {
            Some(object) => self.registry.get_or_assign_scope_id(object, group),
            None => self.registry.assign_bindings_id(scope.bindings.clone(), group),
        };

        Scope {
            kind: scope.kind,
            object: RemoteObject {
                class_name: Some("Object".to_string()),
                description: Some("Object".to_string()),
                object_id: Some(id.to_string()),
                ..RemoteObject::new(RemoteObjectType::Object)
            },
            name: scope.name.clone(),
        }
    }

    /// Properties of a tracked object. Child objects inherit the record's
    /// group.
    pub fn properties(
        &self,
        record: &ObjectRecord<E::Object>,
        own_only: bool,
        accessors_only: bool,
        preview: bool,
    ) -> GetPropertiesResult {
        let group = record.group.as_deref();
        let object = match &record.target {
            ObjectTarget::Bindings(bindings) => {
                let result = if accessors_only {
                    Vec::new()
                } else {
                    bindings
                        .iter()
                        .map(|binding| PropertyDescriptor {
                            name: binding.name.clone(),
                            value: Some(self.remote_object(
                                binding.value.as_ref().unwrap_or(&JsValue::Undefined),
                                group,
                                preview,
                            )),
                            writable: Some(true),
                            get: None,
                            set: None,
                            configurable: false,
                            enumerable: true,
                            is_own: Some(true),
                        })
                        .collect()
                };
                return GetPropertiesResult { result, internal_properties: None };
            }
            ObjectTarget::Object(object) | ObjectTarget::ScopeObject(object) => object,
        };

        let keep = |entry: &PropertyEntry<E::Object>| !accessors_only || entry.is_accessor();
        let own = self.engine.own_properties(object);
        let mut seen: HashSet<String> = own.iter().map(|entry| entry.name.clone()).collect();
        let mut result: Vec<_> = own
            .iter()
            .filter(|entry| keep(entry))
            .map(|entry| self.descriptor(entry, true, group, preview))
            .collect();

        let prototype = if record.is_scope() { None } else { self.engine.prototype(object) };
        let mut internal_properties = None;
        if let Some(prototype) = prototype {
            if own_only {
                internal_properties = Some(vec![InternalPropertyDescriptor {
                    name: "[[Prototype]]".to_string(),
                    value: Some(self.remote_object(&JsValue::Object(prototype), group, false)),
                }]);
            } else {
                for entry in self.engine.own_properties(&prototype) {
                    if keep(&entry) && seen.insert(entry.name.clone()) {
                        result.push(self.descriptor(&entry, false, group, preview));
                    }
                }
            }
        }

        GetPropertiesResult { result, internal_properties }
    }

    fn descriptor(
        &self,
        entry: &PropertyEntry<E::Object>,
        is_own: bool,
        group: Option<&str>,
        preview: bool,
    ) -> PropertyDescriptor {
        let function = |f: &Option<E::Object>| {
            f.as_ref().map(|f| self.remote_object(&JsValue::Object(f.clone()), group, false))
        };
        let accessor = entry.is_accessor();

        PropertyDescriptor {
            name: entry.name.clone(),
            value: if accessor {
                None
            } else {
                entry.value.as_ref().map(|value| self.remote_object(value, group, preview))
            },
            writable: (!accessor).then_some(entry.writable),
            get: function(&entry.getter),
            set: function(&entry.setter),
            configurable: entry.configurable,
            enumerable: entry.enumerable,
            is_own: Some(is_own),
        }
    }

    /// `exceptionDetails` for a thrown exception.
    pub fn exception_details(
        &self,
        exception: &ThrownException<E::Object>,
        exception_id: u32,
        group: Option<&str>,
    ) -> ExceptionDetails {
        let location = exception.location.as_ref().map(|l| self.location(l));
        let url = exception
            .location
            .as_ref()
            .and_then(|l| self.registry.source_by_key(&l.source_key))
            .map(|source| source.url().to_string());

        ExceptionDetails {
            exception_id,
            text: exception.message.clone(),
            line_number: location.as_ref().map_or(0, |l| l.line_number),
            column_number: location.as_ref().and_then(|l| l.column_number).unwrap_or(0),
            script_id: location.map(|l| l.script_id),
            url,
            exception: Some(self.remote_object(&exception.value, group, false)),
        }
    }
}

/// Protocol type and subtype of an engine object class.
fn classify(class: ObjectClass) -> (RemoteObjectType, Option<RemoteObjectSubtype>) {
    let subtype = match class {
        ObjectClass::Plain | ObjectClass::Function => None,
        ObjectClass::Array => Some(RemoteObjectSubtype::Array),
        ObjectClass::RegExp => Some(RemoteObjectSubtype::Regexp),
        ObjectClass::Date => Some(RemoteObjectSubtype::Date),
        ObjectClass::Map => Some(RemoteObjectSubtype::Map),
        ObjectClass::Set => Some(RemoteObjectSubtype::Set),
        ObjectClass::WeakMap => Some(RemoteObjectSubtype::Weakmap),
        ObjectClass::WeakSet => Some(RemoteObjectSubtype::Weakset),
        ObjectClass::Error => Some(RemoteObjectSubtype::Error),
        ObjectClass::Proxy => Some(RemoteObjectSubtype::Proxy),
        ObjectClass::Promise => Some(RemoteObjectSubtype::Promise),
        ObjectClass::TypedArray => Some(RemoteObjectSubtype::Typedarray),
    };
    let kind = if class == ObjectClass::Function {
        RemoteObjectType::Function
    } else {
        RemoteObjectType::Object
    };
    (kind, subtype)
}

fn number_object(n: f64) -> RemoteObject {
    let number = RemoteObject::new(RemoteObjectType::Number);
    let unserializable = if n.is_nan() {
        Some("NaN")
    } else if n.is_infinite() {
        Some(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 && n.is_sign_negative() {
        Some("-0")
    } else {
        None
    };

    if let Some(text) = unserializable {
        return RemoteObject {
            unserializable_value: Some(text.to_string()),
            description: Some(text.to_string()),
            ..number
        };
    }

    let value = if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    };
    RemoteObject { value: Some(value), description: Some(format_number(n)), ..number }
}

/// Display form of a finite number: integers without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuggee::{
        AstVisitor, Binding, BreakPoint, EvaluationError, PauseType, ScriptAst, SourcePosition,
    };
    use cdp_bridge_common::types::ScopeType;
    use serde_json::json;
    use std::collections::HashMap;

    struct NoAst;

    impl ScriptAst for NoAst {
        fn walk(&self, _visitor: &mut dyn AstVisitor) {}
    }

    struct TestObject {
        class: ObjectClass,
        constructor: &'static str,
        description: &'static str,
        properties: Vec<PropertyEntry<u32>>,
        prototype: Option<u32>,
    }

    #[derive(Default)]
    struct TestEngine {
        objects: HashMap<u32, TestObject>,
    }

    impl TestEngine {
        fn with(mut self, id: u32, object: TestObject) -> Self {
            self.objects.insert(id, object);
            self
        }
    }

    fn plain(properties: Vec<PropertyEntry<u32>>, prototype: Option<u32>) -> TestObject {
        TestObject { class: ObjectClass::Plain, constructor: "Object", description: "Object", properties, prototype }
    }

    impl ScriptEngine for TestEngine {
        type Object = u32;

        fn engine_name(&self) -> &str {
            "Test"
        }

        fn engine_version(&self) -> &str {
            "1.0"
        }

        fn evaluate(&self, _expression: &str) -> Result<JsValue<u32>, EvaluationError<u32>> {
            Ok(JsValue::Undefined)
        }

        fn own_properties(&self, object: &u32) -> Vec<PropertyEntry<u32>> {
            self.objects.get(object).map(|o| o.properties.clone()).unwrap_or_default()
        }

        fn prototype(&self, object: &u32) -> Option<u32> {
            self.objects.get(object).and_then(|o| o.prototype)
        }

        fn constructor_name(&self, object: &u32) -> Option<String> {
            self.objects.get(object).map(|o| o.constructor.to_string())
        }

        fn classify(&self, object: &u32) -> ObjectClass {
            self.objects.get(object).map_or(ObjectClass::Plain, |o| o.class)
        }

        fn describe(&self, object: &u32) -> String {
            self.objects.get(object).map_or_else(|| "Object".to_string(), |o| o.description.to_string())
        }

        fn add_breakpoint(&self, _breakpoint: &BreakPoint) {}

        fn remove_breakpoint(&self, _breakpoint: &BreakPoint) {}

        fn set_breakpoints_active(&self, _active: bool) {}
    }

    fn inspector(engine: TestEngine) -> (Inspector<TestEngine>, Arc<RuntimeRegistry<u32>>) {
        let registry = Arc::new(RuntimeRegistry::new());
        (Inspector::new(Arc::new(engine), registry.clone()), registry)
    }

    fn to_json(object: &RemoteObject) -> Value {
        serde_json::to_value(object).unwrap()
    }

    #[test]
    fn test_primitive_mirrors() {
        let (inspector, _) = inspector(TestEngine::default());
        let mirror = |value: JsValue<u32>| to_json(&inspector.remote_object(&value, None, false));

        assert_eq!(mirror(JsValue::Undefined), json!({ "type": "undefined" }));
        assert_eq!(mirror(JsValue::Null), json!({ "type": "object", "subtype": "null", "value": null }));
        assert_eq!(
            mirror(JsValue::Boolean(true)),
            json!({ "type": "boolean", "value": true, "description": "true" })
        );
        assert_eq!(
            mirror(JsValue::String("hi".to_string())),
            json!({ "type": "string", "value": "hi", "description": "hi" })
        );
        assert_eq!(
            mirror(JsValue::BigInt("123".to_string())),
            json!({ "type": "bigint", "unserializableValue": "123n", "description": "123n" })
        );
        assert_eq!(
            mirror(JsValue::Symbol("Symbol(foo)".to_string())),
            json!({ "type": "symbol", "description": "Symbol(foo)" })
        );
    }

    #[test]
    fn test_number_mirrors() {
        let (inspector, _) = inspector(TestEngine::default());
        let mirror = |n: f64| to_json(&inspector.remote_object(&JsValue::Number(n), None, false));

        assert_eq!(mirror(42.0), json!({ "type": "number", "value": 42, "description": "42" }));
        assert_eq!(mirror(1.5), json!({ "type": "number", "value": 1.5, "description": "1.5" }));
        assert_eq!(mirror(0.0), json!({ "type": "number", "value": 0, "description": "0" }));
        for (n, text) in [(f64::NAN, "NaN"), (f64::INFINITY, "Infinity"), (f64::NEG_INFINITY, "-Infinity"), (-0.0, "-0")] {
            assert_eq!(
                mirror(n),
                json!({ "type": "number", "unserializableValue": text, "description": text })
            );
        }
    }

    #[test]
    fn test_object_mirror_registers_id() {
        let engine = TestEngine::default().with(
            7,
            TestObject {
                class: ObjectClass::Array,
                constructor: "Array",
                description: "Array(2)",
                properties: Vec::new(),
                prototype: None,
            },
        );
        let (inspector, registry) = inspector(engine);

        let mirror = inspector.remote_object(&JsValue::Object(7), Some("console"), false);
        assert_eq!(mirror.kind, RemoteObjectType::Object);
        assert_eq!(mirror.subtype, Some(RemoteObjectSubtype::Array));
        assert_eq!(mirror.class_name.as_deref(), Some("Array"));
        assert_eq!(mirror.description.as_deref(), Some("Array(2)"));
        assert!(mirror.preview.is_none());

        let id: u64 = mirror.object_id.unwrap().parse().unwrap();
        assert_eq!(registry.object(id).unwrap().group.as_deref(), Some("console"));

        let again = inspector.remote_object(&JsValue::Object(7), None, false);
        assert_eq!(again.object_id, Some(id.to_string()));
    }

    #[test]
    fn test_preview_limits_properties() {
        let properties =
            (0..7).map(|i| PropertyEntry::data(format!("p{i}"), JsValue::Number(i as f64))).collect();
        let engine = TestEngine::default().with(1, plain(properties, None));
        let (inspector, _) = inspector(engine);

        let preview = inspector.remote_object(&JsValue::Object(1), None, true).preview.unwrap();
        assert!(preview.overflow);
        assert_eq!(preview.properties.len(), PREVIEW_PROPERTIES);
        assert_eq!(preview.properties[3].name, "p3");
        assert_eq!(preview.properties[3].kind, PropertyPreviewType::Number);
        assert_eq!(preview.properties[3].value.as_deref(), Some("3"));
    }

    #[test]
    fn test_properties_include_prototype_chain_level() {
        let engine = TestEngine::default()
            .with(
                1,
                plain(
                    vec![
                        PropertyEntry::data("a", JsValue::Number(1.0)),
                        PropertyEntry::accessor("b", Some(3), None),
                    ],
                    Some(2),
                ),
            )
            .with(2, plain(vec![PropertyEntry::data("a", JsValue::Null), PropertyEntry::data("c", JsValue::Null)], None))
            .with(3, TestObject {
                class: ObjectClass::Function,
                constructor: "Function",
                description: "function get b()",
                properties: Vec::new(),
                prototype: None,
            });
        let (inspector, registry) = inspector(engine);
        let id = registry.get_or_assign_object_id(&1, Some("g"));
        let record = registry.object(id).unwrap();

        let all = inspector.properties(&record, false, false, false);
        let names: Vec<_> = all.result.iter().map(|p| (p.name.as_str(), p.is_own)).collect();
        assert_eq!(names, vec![("a", Some(true)), ("b", Some(true)), ("c", Some(false))]);
        assert!(all.internal_properties.is_none());

        let getter = all.result[1].get.as_ref().unwrap();
        assert_eq!(getter.kind, RemoteObjectType::Function);
        assert!(all.result[1].value.is_none());
        assert!(all.result[1].writable.is_none());

        let own = inspector.properties(&record, true, false, false);
        assert_eq!(own.result.len(), 2);
        let internal = own.internal_properties.unwrap();
        assert_eq!(internal[0].name, "[[Prototype]]");

        let accessors = inspector.properties(&record, false, true, false);
        assert_eq!(accessors.result.len(), 1);
        assert_eq!(accessors.result[0].name, "b");

        // Children inherit the record's group.
        assert_eq!(registry.release_object_group("g"), 3);
    }

    #[test]
    fn test_scope_properties() {
        let engine = TestEngine::default()
            .with(1, plain(vec![PropertyEntry::data("g", JsValue::Boolean(false))], Some(2)))
            .with(2, plain(vec![PropertyEntry::data("hidden", JsValue::Null)], None));
        let (inspector, registry) = inspector(engine);

        let global = registry.get_or_assign_scope_id(&1, None);
        let result = inspector.properties(&registry.object(global).unwrap(), false, false, false);
        assert_eq!(result.result.len(), 1);
        assert!(result.internal_properties.is_none());

        let bindings = registry.assign_bindings_id(
            vec![
                Binding { name: "x".to_string(), value: Some(JsValue::Number(1.0)) },
                Binding { name: "y".to_string(), value: None },
            ],
            None,
        );
        let result = inspector.properties(&registry.object(bindings).unwrap(), false, false, false);
        assert_eq!(result.result[0].name, "x");
        assert_eq!(result.result[1].value.as_ref().unwrap().kind, RemoteObjectType::Undefined);
    }

    #[test]
    fn test_call_frames() {
        let (inspector, registry) = inspector(TestEngine::default().with(9, plain(Vec::new(), None)));
        registry.add_source("main", "file:///main.js", "f();\n", Arc::new(NoAst));

        let frame = StackFrame {
            function_name: "f".to_string(),
            location: SourceLocation::new("main", SourcePosition::new(3, 4)),
            function_location: Some(SourceLocation::new("main", SourcePosition::new(2, 0))),
            scope_chain: vec![
                DebugScope { kind: ScopeType::Local, name: Some("f".to_string()), binding_object: None, bindings: Vec::new() },
                DebugScope { kind: ScopeType::Global, name: None, binding_object: Some(9), bindings: Vec::new() },
            ],
            this: JsValue::Undefined,
            return_value: None,
        };
        let unknown = StackFrame {
            location: SourceLocation::new("eval-1", SourcePosition::new(1, 0)),
            function_location: None,
            scope_chain: Vec::new(),
            ..frame.clone()
        };
        let info = DebugInfo { pause_type: PauseType::Breakpoint, call_stack: vec![frame, unknown] };

        let frames = inspector.call_frames(&info);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].call_frame_id, "0");
        assert_eq!(frames[0].url, "file:///main.js");
        assert_eq!(
            serde_json::to_value(&frames[0].location).unwrap(),
            json!({ "scriptId": "1", "lineNumber": 2, "columnNumber": 4 })
        );
        assert_eq!(frames[0].function_location.as_ref().unwrap().line_number, 1);
        assert_eq!(frames[0].scope_chain[0].kind, ScopeType::Local);
        assert_eq!(frames[0].scope_chain[1].object.class_name.as_deref(), Some("Object"));

        assert_eq!(frames[1].location.script_id, "eval-1");
        assert_eq!(frames[1].url, "");

        assert_eq!(registry.release_object_group(BACKTRACE_GROUP), 2);
    }

    #[test]
    fn test_exception_details() {
        let (inspector, registry) = inspector(TestEngine::default());
        registry.add_source("main", "file:///main.js", "throw 1;\n", Arc::new(NoAst));

        let exception = ThrownException {
            message: "Uncaught 1".to_string(),
            location: Some(SourceLocation::new("main", SourcePosition::new(1, 6))),
            value: JsValue::Number(1.0),
        };
        let details = inspector.exception_details(&exception, 3, None);
        assert_eq!(details.exception_id, 3);
        assert_eq!(details.text, "Uncaught 1");
        assert_eq!((details.line_number, details.column_number), (0, 6));
        assert_eq!(details.script_id.as_deref(), Some("1"));
        assert_eq!(details.url.as_deref(), Some("file:///main.js"));
        assert_eq!(details.exception.unwrap().kind, RemoteObjectType::Number);
    }
}
