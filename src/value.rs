//! Dynamic values exchanged between service definitions, factories and objects.
//!
//! A [`Value`] is what an argument descriptor resolves to and what a class
//! factory returns. Objects are carried as [`Instance`] handles so that setter
//! calls and property injection can reach them after construction.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Member visibility reported by an [`Injectable`] for one of its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Failure reported by an object while invoking a method or writing a property.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    #[error("method '{0}' does not exist")]
    UnknownMethod(String),
    #[error("property '{0}' does not exist")]
    UnknownProperty(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Failed(String),
}

/// An object the builder can inject into.
///
/// Implementors expose their setters through [`Injectable::invoke`] and their
/// writable fields through [`Injectable::visibility`] / [`Injectable::assign`].
/// The defaults describe an object with no methods and no properties.
pub trait Injectable: Any + Send {
    fn class_name(&self) -> &str;

    fn invoke(&mut self, method: &str, _args: Vec<Value>) -> Result<Value, InvokeError> {
        Err(InvokeError::UnknownMethod(method.to_string()))
    }

    fn visibility(&self, _property: &str) -> Option<Visibility> {
        None
    }

    fn assign(&mut self, property: &str, _value: Value) -> Result<(), InvokeError> {
        Err(InvokeError::UnknownProperty(property.to_string()))
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a constructed object.
#[derive(Clone)]
pub struct Instance {
    class_name: Arc<str>,
    object: Arc<Mutex<dyn Injectable>>,
}

impl Instance {
    pub fn new<T: Injectable>(object: T) -> Self {
        let class_name: Arc<str> = Arc::from(object.class_name());
        let object: Arc<Mutex<dyn Injectable>> = Arc::new(Mutex::new(object));
        Self { class_name, object }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, InvokeError> {
        self.object.lock().invoke(method, args)
    }

    pub fn visibility(&self, property: &str) -> Option<Visibility> {
        self.object.lock().visibility(property)
    }

    pub fn assign(&self, property: &str, value: Value) -> Result<(), InvokeError> {
        self.object.lock().assign(property, value)
    }

    /// Borrow the concrete object, if it is a `T`.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.object.lock();
        guard.as_any().downcast_ref::<T>().map(f)
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.object.lock().as_any().is::<T>()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// 动态值
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Instance),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Object(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        hits: usize,
    }

    impl Injectable for Probe {
        fn class_name(&self) -> &str {
            "Probe"
        }

        fn invoke(&mut self, method: &str, _args: Vec<Value>) -> Result<Value, InvokeError> {
            match method {
                "hit" => {
                    self.hits += 1;
                    Ok(Value::Int(self.hits as i64))
                }
                other => Err(InvokeError::UnknownMethod(other.to_string())),
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_instance_invoke_and_downcast() {
        let instance = Instance::new(Probe { hits: 0 });
        assert_eq!(instance.class_name(), "Probe");
        assert_eq!(instance.invoke("hit", vec![]), Ok(Value::Int(1)));
        assert_eq!(instance.with(|p: &Probe| p.hits), Some(1));
        assert!(instance.with(|s: &String| s.len()).is_none());
        assert!(matches!(
            instance.invoke("missing", vec![]),
            Err(InvokeError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_instance_equality_is_identity() {
        let a = Instance::new(Probe { hits: 0 });
        let b = Instance::new(Probe { hits: 0 });
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_json_conversion_keeps_null() {
        let value = Value::from(serde_json::json!({"a": null, "b": [1, 2.5, "x"]}));
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map.get("a"), Some(&Value::Null));
        assert_eq!(
            map.get("b"),
            Some(&Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Str("x".into())
            ]))
        );
    }
}
