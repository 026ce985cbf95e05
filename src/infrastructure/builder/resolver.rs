//! 参数解析器
//!
//! 将单个参数描述符解析为具体值。`position` 仅用于错误信息，从 0 开始计数。

use super::{ArgumentDescriptor, BuildError};
use crate::infrastructure::container::Container;
use crate::value::Value;
use tracing::trace;

/// 解析单个参数描述符
pub fn resolve_argument(
    container: Option<&dyn Container>,
    position: usize,
    descriptor: &ArgumentDescriptor,
) -> Result<Value, BuildError> {
    match descriptor {
        ArgumentDescriptor::ServiceRef { name } => {
            if name.is_empty() {
                return Err(BuildError::MissingRequiredField {
                    field: "name",
                    position,
                });
            }
            let container = container.ok_or(BuildError::InvalidContainer { position })?;
            trace!(position, service = %name, "Resolving service argument");
            Ok(container.get(name, None)?)
        }
        ArgumentDescriptor::Literal { value } => Ok(value.clone()),
        ArgumentDescriptor::InstanceRef {
            class_name,
            arguments,
        } => {
            if class_name.is_empty() {
                return Err(BuildError::MissingRequiredField {
                    field: "className",
                    position,
                });
            }
            let container = container.ok_or(BuildError::InvalidContainer { position })?;
            trace!(position, class = %class_name, "Resolving instance argument");
            match arguments {
                // 无参数时走容器的默认路径，保留其共享语义
                None => Ok(container.get(class_name, None)?),
                Some(arguments) => {
                    let resolved = resolve_arguments(Some(container), arguments)?;
                    Ok(container.get(class_name, Some(resolved))?)
                }
            }
        }
    }
}

/// 按声明顺序解析参数列表
pub fn resolve_arguments(
    container: Option<&dyn Container>,
    descriptors: &[ArgumentDescriptor],
) -> Result<Vec<Value>, BuildError> {
    descriptors
        .iter()
        .enumerate()
        .map(|(position, descriptor)| resolve_argument(container, position, descriptor))
        .collect()
}
