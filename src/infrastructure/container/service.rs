//! 已注册服务
//!
//! 一个服务由名称、来源和生命周期组成。来源可以是类名、服务定义、
//! 工厂闭包或现成的值。

use super::{Container, ContainerError, ServiceContainer, ServiceLifetime};
use crate::infrastructure::builder::{ArgumentDescriptor, BuildError, ServiceDefinition};
use crate::infrastructure::factory::BoxError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// 工厂闭包：接收容器和可选的覆盖参数
pub type ServiceFactoryFn =
    Arc<dyn Fn(&ServiceContainer, Option<Vec<Value>>) -> Result<Value, BoxError> + Send + Sync>;

/// 服务来源
#[derive(Clone)]
pub enum ServiceSource {
    /// 通过类工厂注册表构造
    Class(String),
    /// 通过实例构建器构造
    Definition(ServiceDefinition),
    /// 调用闭包
    Factory(ServiceFactoryFn),
    /// 直接返回的值
    Value(Value),
}

impl ServiceSource {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&ServiceContainer, Option<Vec<Value>>) -> Result<Value, BoxError>
            + Send
            + Sync
            + 'static,
    {
        ServiceSource::Factory(Arc::new(factory))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceSource::Class(_) => "class",
            ServiceSource::Definition(_) => "definition",
            ServiceSource::Factory(_) => "factory",
            ServiceSource::Value(_) => "value",
        }
    }
}

impl fmt::Debug for ServiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceSource::Class(name) => f.debug_tuple("Class").field(name).finish(),
            ServiceSource::Definition(def) => f.debug_tuple("Definition").field(def).finish(),
            ServiceSource::Factory(_) => f.write_str("Factory(..)"),
            ServiceSource::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<ServiceDefinition> for ServiceSource {
    fn from(definition: ServiceDefinition) -> Self {
        ServiceSource::Definition(definition)
    }
}

impl From<Value> for ServiceSource {
    fn from(value: Value) -> Self {
        ServiceSource::Value(value)
    }
}

/// 已注册的服务
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    source: ServiceSource,
    lifetime: ServiceLifetime,
}

impl Service {
    pub fn new(name: impl Into<String>, source: ServiceSource, lifetime: ServiceLifetime) -> Self {
        Self {
            name: name.into(),
            source,
            lifetime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn is_shared(&self) -> bool {
        self.lifetime == ServiceLifetime::Singleton
    }

    pub fn set_shared(&mut self, shared: bool) {
        self.lifetime = if shared {
            ServiceLifetime::Singleton
        } else {
            ServiceLifetime::Transient
        };
    }

    /// 替换服务定义中某个位置的构造参数
    pub fn set_parameter(
        &mut self,
        position: usize,
        descriptor: ArgumentDescriptor,
    ) -> Result<(), ContainerError> {
        let ServiceSource::Definition(definition) = &mut self.source else {
            return Err(ContainerError::NotADefinition(self.name.clone()));
        };

        let arguments = definition.arguments.get_or_insert_with(Vec::new);
        match position {
            p if p < arguments.len() => arguments[p] = descriptor,
            p if p == arguments.len() => arguments.push(descriptor),
            _ => {
                return Err(ContainerError::InvalidParameterPosition {
                    service: self.name.clone(),
                    position,
                })
            }
        }
        Ok(())
    }

    /// 解析服务（不涉及共享实例缓存）
    pub fn resolve(
        &self,
        container: &ServiceContainer,
        parameters: Option<Vec<Value>>,
    ) -> Result<Value, ContainerError> {
        let build_error = |source: BuildError| ContainerError::Build {
            service: self.name.clone(),
            source: Box::new(source),
        };

        match &self.source {
            ServiceSource::Class(class_name) => container
                .builder()
                .classes()
                .construct(class_name, parameters.unwrap_or_default())
                .map_err(build_error),
            ServiceSource::Definition(definition) => container
                .builder()
                .build(Some(container as &dyn Container), definition, parameters)
                .map_err(build_error),
            ServiceSource::Factory(factory) => {
                factory(container, parameters).map_err(|source| ContainerError::FactoryFailed {
                    service: self.name.clone(),
                    source,
                })
            }
            ServiceSource::Value(value) => Ok(value.clone()),
        }
    }
}
