pub mod cli;
pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;
pub mod transaction;
pub mod value;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::AppError;
pub use infrastructure::{
    ArgumentDescriptor, BuildError, ClassRegistry, Container, ContainerError, InstanceBuilder,
    MethodCall, PropertyInjection, ServiceContainer, ServiceDefinition,
};
pub use transaction::{Transaction, TransactionError, TransactionManager};
pub use value::{Injectable, Instance, InvokeError, Value, Visibility};
