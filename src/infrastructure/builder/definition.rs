//! Service definitions and argument descriptors.
//!
//! Definitions can be written directly in Rust or parsed from a loosely-typed
//! map (JSON or TOML), which is how configuration files declare them:
//!
//! ```json
//! {
//!   "className": "Mailer",
//!   "arguments": [
//!     { "type": "service", "name": "transport" },
//!     { "type": "parameter", "value": "noreply@example.com" }
//!   ],
//!   "calls": [
//!     { "method": "setLogger", "arguments": [{ "type": "service", "name": "logger" }] }
//!   ],
//!   "properties": [
//!     { "name": "retries", "value": { "type": "parameter", "value": 3 } }
//!   ]
//! }
//! ```

use super::BuildError;
use crate::value::Value;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

/// How to obtain one constructor, method or property value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentDescriptor {
    /// Ask the container for a named service.
    ServiceRef { name: String },
    /// Pass the value through unchanged.
    Literal { value: Value },
    /// Ask the container for an instance of a class, optionally with arguments.
    InstanceRef {
        class_name: String,
        arguments: Option<Vec<ArgumentDescriptor>>,
    },
}

impl ArgumentDescriptor {
    pub fn service(name: impl Into<String>) -> Self {
        ArgumentDescriptor::ServiceRef { name: name.into() }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ArgumentDescriptor::Literal {
            value: value.into(),
        }
    }

    pub fn instance(class_name: impl Into<String>) -> Self {
        ArgumentDescriptor::InstanceRef {
            class_name: class_name.into(),
            arguments: None,
        }
    }

    pub fn instance_with(
        class_name: impl Into<String>,
        arguments: Vec<ArgumentDescriptor>,
    ) -> Self {
        ArgumentDescriptor::InstanceRef {
            class_name: class_name.into(),
            arguments: Some(arguments),
        }
    }

    /// Parse the map form `{ "type": ..., ... }` found at `position`.
    pub fn from_json(position: usize, raw: &JsonValue) -> Result<Self, BuildError> {
        let Some(map) = raw.as_object() else {
            return Err(BuildError::UnknownArgumentKind { position });
        };

        match map.get("type").and_then(JsonValue::as_str) {
            Some("service") => {
                let name = required_str(map, "name", position)?;
                Ok(ArgumentDescriptor::ServiceRef { name })
            }
            Some("parameter") | Some("literal") => {
                // 显式 null 是合法字面量，缺失才是错误
                let value = map
                    .get("value")
                    .cloned()
                    .ok_or(BuildError::MissingRequiredField {
                        field: "value",
                        position,
                    })?;
                Ok(ArgumentDescriptor::Literal {
                    value: Value::from(value),
                })
            }
            Some("instance") => {
                let class_name = required_str(map, "className", position)?;
                let arguments = optional_list(map, "arguments", parse_arguments)?;
                Ok(ArgumentDescriptor::InstanceRef {
                    class_name,
                    arguments,
                })
            }
            _ => Err(BuildError::UnknownArgumentKind { position }),
        }
    }

    fn collect_service_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ArgumentDescriptor::ServiceRef { name } => out.push(name),
            ArgumentDescriptor::Literal { .. } => {}
            ArgumentDescriptor::InstanceRef { arguments, .. } => {
                for argument in arguments.iter().flatten() {
                    argument.collect_service_references(out);
                }
            }
        }
    }
}

/// A setter call applied after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Option<Vec<ArgumentDescriptor>>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Vec<ArgumentDescriptor>) -> Self {
        Self {
            method: method.into(),
            arguments: Some(arguments),
        }
    }
}

/// A public property written after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInjection {
    pub name: String,
    pub value: ArgumentDescriptor,
}

impl PropertyInjection {
    pub fn new(name: impl Into<String>, value: ArgumentDescriptor) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Declarative recipe for building one object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDefinition {
    pub class_name: String,
    pub arguments: Option<Vec<ArgumentDescriptor>>,
    pub calls: Option<Vec<MethodCall>>,
    pub properties: Option<Vec<PropertyInjection>>,
}

impl ServiceDefinition {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<ArgumentDescriptor>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_call(mut self, call: MethodCall) -> Self {
        self.calls.get_or_insert_with(Vec::new).push(call);
        self
    }

    pub fn with_property(mut self, property: PropertyInjection) -> Self {
        self.properties.get_or_insert_with(Vec::new).push(property);
        self
    }

    pub fn has_calls(&self) -> bool {
        self.calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|props| !props.is_empty())
    }

    /// Every service name this definition asks the container for, in
    /// declaration order (constructor arguments, then calls, then properties).
    pub fn service_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for argument in self.arguments.iter().flatten() {
            argument.collect_service_references(&mut out);
        }
        for call in self.calls.iter().flatten() {
            for argument in call.arguments.iter().flatten() {
                argument.collect_service_references(&mut out);
            }
        }
        for property in self.properties.iter().flatten() {
            property.value.collect_service_references(&mut out);
        }
        out
    }

    /// Parse the map form of a definition.
    pub fn from_json(raw: &JsonValue) -> Result<Self, BuildError> {
        let map = raw.as_object().ok_or_else(|| {
            BuildError::MalformedDefinition("service definition must be a map".to_string())
        })?;

        let class_name = match map.get("className").and_then(JsonValue::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(BuildError::MissingClassName),
        };

        let arguments = optional_list(map, "arguments", parse_arguments)?;
        let calls = optional_list(map, "calls", |items| {
            items
                .iter()
                .enumerate()
                .map(|(position, item)| parse_call(position, item))
                .collect()
        })?;
        let properties = optional_list(map, "properties", |items| {
            items
                .iter()
                .enumerate()
                .map(|(position, item)| parse_property(position, item))
                .collect()
        })?;

        Ok(Self {
            class_name,
            arguments,
            calls,
            properties,
        })
    }
}

impl<'de> Deserialize<'de> for ServiceDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = JsonValue::deserialize(deserializer)?;
        ServiceDefinition::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_arguments(items: &[JsonValue]) -> Result<Vec<ArgumentDescriptor>, BuildError> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| ArgumentDescriptor::from_json(position, item))
        .collect()
}

fn parse_call(position: usize, raw: &JsonValue) -> Result<MethodCall, BuildError> {
    let map = raw.as_object().ok_or_else(|| {
        BuildError::MalformedDefinition(format!("method call must be a map on position {position}"))
    })?;
    let method = required_str(map, "method", position)?;
    let arguments = optional_list(map, "arguments", parse_arguments)?;
    Ok(MethodCall { method, arguments })
}

fn parse_property(position: usize, raw: &JsonValue) -> Result<PropertyInjection, BuildError> {
    let map = raw.as_object().ok_or_else(|| {
        BuildError::MalformedDefinition(format!("property must be a map on position {position}"))
    })?;
    let name = required_str(map, "name", position)?;
    let value = map.get("value").ok_or(BuildError::MissingRequiredField {
        field: "value",
        position,
    })?;
    let value = ArgumentDescriptor::from_json(position, value)?;
    Ok(PropertyInjection { name, value })
}

fn required_str(
    map: &Map<String, JsonValue>,
    field: &'static str,
    position: usize,
) -> Result<String, BuildError> {
    match map.get(field).and_then(JsonValue::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(BuildError::MissingRequiredField { field, position }),
    }
}

/// `None` when the key is absent or null, an error when it is not a list.
fn optional_list<T>(
    map: &Map<String, JsonValue>,
    field: &str,
    parse: impl FnOnce(&[JsonValue]) -> Result<T, BuildError>,
) -> Result<Option<T>, BuildError> {
    match map.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Array(items)) => parse(items).map(Some),
        Some(other) => Err(BuildError::MalformedDefinition(format!(
            "'{field}' must be a list, found {other}"
        ))),
    }
}
