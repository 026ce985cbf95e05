//! 基础设施层
//!
//! 提供依赖注入的具体实现，包括：
//! - 类工厂注册表
//! - 服务定义与实例构建器
//! - 服务容器

pub mod builder;
pub mod container;
pub mod factory;

// 重新导出API
pub use builder::{
    ArgumentDescriptor, BuildError, InstanceBuilder, MethodCall, PropertyInjection,
    ServiceDefinition,
};
pub use container::{
    Container, ContainerError, ContainerStats, Service, ServiceContainer, ServiceLifetime,
    ServiceSource,
};
pub use factory::{BoxError, ClassFactory, ClassRegistry, ConstructResult};
