//! Container module

pub mod service;
pub mod service_container;

pub use service::{Service, ServiceFactoryFn, ServiceSource};
pub use service_container::{ContainerStats, ServiceContainer};

use super::builder::BuildError;
use super::factory::BoxError;
use crate::value::Value;
use thiserror::Error;

/// 服务定位接口
///
/// 参数解析器只依赖此接口；`parameters` 为 `Some` 时覆盖服务声明的构造参数。
pub trait Container: Send + Sync {
    fn get(&self, name: &str, parameters: Option<Vec<Value>>) -> Result<Value, ContainerError>;

    fn has(&self, name: &str) -> bool;
}

// Lifecycle enum kept at container module level so services can reference it via `super::ServiceLifetime`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceLifetime {
    /// Single instance for the lifetime of the container
    Singleton,
    /// New instance per resolve
    #[default]
    Transient,
}

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Service '{0}' wasn't found in the dependency injection container")]
    ServiceNotFound(String),

    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("Service '{service}' cannot be resolved: {source}")]
    Build {
        service: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Factory for service '{service}' failed: {source}")]
    FactoryFailed {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("Service '{0}' is not backed by a service definition")]
    NotADefinition(String),

    #[error("Service '{service}' has no constructor argument on position {position}")]
    InvalidParameterPosition { service: String, position: usize },
}
