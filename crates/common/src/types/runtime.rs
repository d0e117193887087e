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
use serde_json::Value;

/// Protocol script identifier (a decimal string).
pub type ScriptId = String;

/// Remote object identifier handed out by the object registry.
pub type RemoteObjectId = String;

/// Top-level type of a [`RemoteObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteObjectType {
    /// Any non-callable object, including `null`
    Object,
    /// Callable object
    Function,
    /// `undefined`
    Undefined,
    /// String primitive
    String,
    /// Number primitive
    Number,
    /// Boolean primitive
    Boolean,
    /// Symbol primitive
    Symbol,
    /// BigInt primitive
    Bigint,
}

/// Object subtype hint, only set for `object` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteObjectSubtype {
    /// Array instance
    Array,
    /// The `null` value
    Null,
    /// RegExp instance
    Regexp,
    /// Date instance
    Date,
    /// Map instance
    Map,
    /// Set instance
    Set,
    /// WeakMap instance
    Weakmap,
    /// WeakSet instance
    Weakset,
    /// Error instance
    Error,
    /// Proxy instance
    Proxy,
    /// Promise instance
    Promise,
    /// Typed array instance
    Typedarray,
}

/// Mirror object referencing an engine value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type
    #[serde(rename = "type")]
    pub kind: RemoteObjectType,
    /// Object subtype hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<RemoteObjectSubtype>,
    /// Constructor name for objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Primitive value, or `null` for the null object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Primitive value that has no JSON representation (`NaN`, `-0`, bigint, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    /// String representation of the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Handle for further inspection, set for objects only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    /// Abbreviated property listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ObjectPreview>,
}

impl RemoteObject {
    /// A remote object of `kind` with every optional field unset.
    pub fn new(kind: RemoteObjectType) -> Self {
        Self {
            kind,
            subtype: None,
            class_name: None,
            value: None,
            unserializable_value: None,
            description: None,
            object_id: None,
            preview: None,
        }
    }

    /// A string primitive.
    pub fn string(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: Some(Value::String(text.clone())),
            description: Some(text),
            ..Self::new(RemoteObjectType::String)
        }
    }
}

/// Abbreviated object listing shown inline by DevTools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPreview {
    /// Object type
    #[serde(rename = "type")]
    pub kind: RemoteObjectType,
    /// Object subtype hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<RemoteObjectSubtype>,
    /// String representation of the object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// True when some properties were left out
    pub overflow: bool,
    /// Previewed properties
    pub properties: Vec<PropertyPreview>,
}

/// Type of a previewed property; accessors are not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyPreviewType {
    /// Object
    Object,
    /// Function
    Function,
    /// `undefined`
    Undefined,
    /// String
    String,
    /// Number
    Number,
    /// Boolean
    Boolean,
    /// Symbol
    Symbol,
    /// Getter and/or setter
    Accessor,
    /// BigInt
    Bigint,
}

impl From<RemoteObjectType> for PropertyPreviewType {
    fn from(kind: RemoteObjectType) -> Self {
        match kind {
            RemoteObjectType::Object => Self::Object,
            RemoteObjectType::Function => Self::Function,
            RemoteObjectType::Undefined => Self::Undefined,
            RemoteObjectType::String => Self::String,
            RemoteObjectType::Number => Self::Number,
            RemoteObjectType::Boolean => Self::Boolean,
            RemoteObjectType::Symbol => Self::Symbol,
            RemoteObjectType::Bigint => Self::Bigint,
        }
    }
}

/// One property inside an [`ObjectPreview`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPreview {
    /// Property name
    pub name: String,
    /// Property type
    #[serde(rename = "type")]
    pub kind: PropertyPreviewType,
    /// Abbreviated value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Object subtype hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<RemoteObjectSubtype>,
}

/// Object property descriptor returned by `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Value, absent for accessor properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<RemoteObject>,
    /// Whether the value may be changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
    /// Getter function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<RemoteObject>,
    /// Setter function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<RemoteObject>,
    /// Whether the property may be deleted or redefined
    pub configurable: bool,
    /// Whether the property shows up in enumeration
    pub enumerable: bool,
    /// Whether the property lives on the object itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_own: Option<bool>,
}

/// Engine-internal property such as `[[Prototype]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalPropertyDescriptor {
    /// Property name
    pub name: String,
    /// Value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<RemoteObject>,
}

/// Details of an exception thrown during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception id
    pub exception_id: u32,
    /// Exception message
    pub text: String,
    /// Zero-based line of the throw site
    pub line_number: u32,
    /// Zero-based column of the throw site
    pub column_number: u32,
    /// Script containing the throw site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<ScriptId>,
    /// URL of the script containing the throw site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The thrown value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<RemoteObject>,
}

/// Parameters of `Runtime.getProperties`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    /// Object to inspect
    pub object_id: RemoteObjectId,
    /// Only own properties, no prototype chain
    #[serde(default)]
    pub own_properties: Option<bool>,
    /// Only accessor properties
    #[serde(default)]
    pub accessor_properties_only: Option<bool>,
    /// Include previews of object-valued properties
    #[serde(default)]
    pub generate_preview: Option<bool>,
}

/// Result of `Runtime.getProperties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResult {
    /// Object properties
    pub result: Vec<PropertyDescriptor>,
    /// Internal properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_properties: Option<Vec<InternalPropertyDescriptor>>,
}

/// Parameters of `Runtime.releaseObject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectParams {
    /// Object to release
    pub object_id: RemoteObjectId,
}

/// Parameters of `Runtime.releaseObjectGroup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectGroupParams {
    /// Group to release
    pub object_group: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_object_omits_unset_fields() {
        let object = RemoteObject::new(RemoteObjectType::Undefined);
        assert_eq!(serde_json::to_value(&object).unwrap(), json!({ "type": "undefined" }));
    }

    #[test]
    fn test_null_value_is_serialized() {
        let object = RemoteObject {
            subtype: Some(RemoteObjectSubtype::Null),
            value: Some(Value::Null),
            ..RemoteObject::new(RemoteObjectType::Object)
        };
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({ "type": "object", "subtype": "null", "value": null })
        );
    }

    #[test]
    fn test_get_properties_params_optional_flags() {
        let params: GetPropertiesParams =
            serde_json::from_value(json!({ "objectId": "7", "ownProperties": true })).unwrap();
        assert_eq!(params.object_id, "7");
        assert_eq!(params.own_properties, Some(true));
        assert_eq!(params.accessor_properties_only, None);
    }
}
