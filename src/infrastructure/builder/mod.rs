//! 服务构建器
//!
//! 根据声明式服务定义构造对象：
//! - 参数描述符解析（服务引用 / 字面量 / 实例引用）
//! - 构造函数参数注入
//! - setter 调用注入
//! - 公共属性注入

pub mod definition;
pub mod instance;
pub mod resolver;

pub use definition::{ArgumentDescriptor, MethodCall, PropertyInjection, ServiceDefinition};
pub use instance::InstanceBuilder;
pub use resolver::{resolve_argument, resolve_arguments};

use super::container::ContainerError;
use super::factory::BoxError;
use thiserror::Error;

/// 构建错误
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid service definition. Missing 'className' parameter")]
    MissingClassName,

    #[error("Required field '{field}' is missing on position {position}")]
    MissingRequiredField { field: &'static str, position: usize },

    #[error("A valid container is required to resolve the argument on position {position}")]
    InvalidContainer { position: usize },

    #[error("Unknown argument type on position {position}")]
    UnknownArgumentKind { position: usize },

    #[error("Malformed service definition: {0}")]
    MalformedDefinition(String),

    #[error("Class '{0}' is not registered")]
    UnknownClass(String),

    #[error("Failed to construct '{class_name}': {source}")]
    ConstructionFailed {
        class_name: String,
        #[source]
        source: BoxError,
    },

    #[error("Method '{method}' does not exist on '{class_name}'")]
    UnknownMethod { class_name: String, method: String },

    #[error("Call to '{class_name}::{method}' failed: {reason}")]
    MethodCallFailed {
        class_name: String,
        method: String,
        reason: String,
    },

    #[error("Setter injection requires an object, '{class_name}' produced {actual}")]
    SetterOnNonObject {
        class_name: String,
        actual: &'static str,
    },

    #[error("Property injection requires an object, '{class_name}' produced {actual}")]
    PropertyOnNonObject {
        class_name: String,
        actual: &'static str,
    },

    #[error("Property '{property}' of '{class_name}' is not public")]
    PropertyNotPublic {
        class_name: String,
        property: String,
    },

    #[error("Property '{property}' is not declared on '{class_name}'")]
    UnknownProperty {
        class_name: String,
        property: String,
    },

    #[error("Assigning '{class_name}::{property}' failed: {reason}")]
    PropertyAssignFailed {
        class_name: String,
        property: String,
        reason: String,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}
