//! 实例构建器
//!
//! 按以下顺序执行：
//! 1. 校验类名
//! 2. 确定构造参数（调用方覆盖参数优先于声明参数）
//! 3. 通过类工厂注册表构造实例
//! 4. 依次执行 setter 调用
//! 5. 依次注入公共属性

use super::{resolve_argument, resolve_arguments, BuildError, ServiceDefinition};
use crate::infrastructure::container::Container;
use crate::infrastructure::factory::ClassRegistry;
use crate::value::{Instance, InvokeError, Value, Visibility};
use std::sync::Arc;
use tracing::{debug, trace};

/// 实例构建器
#[derive(Clone)]
pub struct InstanceBuilder {
    classes: Arc<ClassRegistry>,
}

impl InstanceBuilder {
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// 根据服务定义构建实例
    ///
    /// `parameters` 为 `Some` 时（即使为空）完全取代定义中声明的构造参数。
    pub fn build(
        &self,
        container: Option<&dyn Container>,
        definition: &ServiceDefinition,
        parameters: Option<Vec<Value>>,
    ) -> Result<Value, BuildError> {
        let class_name = definition.class_name.as_str();
        if class_name.is_empty() {
            return Err(BuildError::MissingClassName);
        }

        let arguments = match parameters {
            Some(overrides) => overrides,
            None => match &definition.arguments {
                Some(descriptors) => resolve_arguments(container, descriptors)?,
                None => Vec::new(),
            },
        };

        debug!(class = %class_name, arg_count = arguments.len(), "Building instance");
        let value = self.classes.construct(class_name, arguments)?;

        let wants_calls = definition.has_calls();
        let wants_properties = definition.has_properties();
        if !wants_calls && !wants_properties {
            return Ok(value);
        }

        let instance = match &value {
            Value::Object(instance) => instance.clone(),
            other if wants_calls => {
                return Err(BuildError::SetterOnNonObject {
                    class_name: class_name.to_string(),
                    actual: other.type_name(),
                })
            }
            other => {
                return Err(BuildError::PropertyOnNonObject {
                    class_name: class_name.to_string(),
                    actual: other.type_name(),
                })
            }
        };

        self.apply_calls(container, definition, &instance)?;
        self.apply_properties(container, definition, &instance)?;

        Ok(value)
    }

    fn apply_calls(
        &self,
        container: Option<&dyn Container>,
        definition: &ServiceDefinition,
        instance: &Instance,
    ) -> Result<(), BuildError> {
        for call in definition.calls.iter().flatten() {
            let arguments = match &call.arguments {
                Some(descriptors) if !descriptors.is_empty() => {
                    resolve_arguments(container, descriptors)?
                }
                _ => Vec::new(),
            };

            trace!(class = %instance.class_name(), method = %call.method, "Applying setter call");
            instance
                .invoke(&call.method, arguments)
                .map_err(|err| match err {
                    InvokeError::UnknownMethod(method) => BuildError::UnknownMethod {
                        class_name: instance.class_name().to_string(),
                        method,
                    },
                    other => BuildError::MethodCallFailed {
                        class_name: instance.class_name().to_string(),
                        method: call.method.clone(),
                        reason: other.to_string(),
                    },
                })?;
        }
        Ok(())
    }

    fn apply_properties(
        &self,
        container: Option<&dyn Container>,
        definition: &ServiceDefinition,
        instance: &Instance,
    ) -> Result<(), BuildError> {
        // 先检查全部属性的可见性，任一失败则不写入任何属性
        for property in definition.properties.iter().flatten() {
            match instance.visibility(&property.name) {
                Some(Visibility::Public) => {}
                Some(_) => {
                    return Err(BuildError::PropertyNotPublic {
                        class_name: instance.class_name().to_string(),
                        property: property.name.clone(),
                    })
                }
                None => {
                    return Err(BuildError::UnknownProperty {
                        class_name: instance.class_name().to_string(),
                        property: property.name.clone(),
                    })
                }
            }
        }

        for (position, property) in definition.properties.iter().flatten().enumerate() {
            let value = resolve_argument(container, position, &property.value)?;
            trace!(class = %instance.class_name(), property = %property.name, "Injecting property");
            instance
                .assign(&property.name, value)
                .map_err(|err| match err {
                    InvokeError::UnknownProperty(name) => BuildError::UnknownProperty {
                        class_name: instance.class_name().to_string(),
                        property: name,
                    },
                    other => BuildError::PropertyAssignFailed {
                        class_name: instance.class_name().to_string(),
                        property: property.name.clone(),
                        reason: other.to_string(),
                    },
                })?;
        }
        Ok(())
    }
}
