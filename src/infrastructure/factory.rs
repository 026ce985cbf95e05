//! 类工厂注册表
//!
//! 以类名为键保存构造函数，替代按字符串类名进行的反射式构造。
//! 宿主应用在构建服务之前注册所有可构造的类。

use super::builder::BuildError;
use crate::value::{Injectable, Value};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// 构造函数返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 构造结果
pub type ConstructResult = Result<Value, BoxError>;

/// 类工厂trait
pub trait ClassFactory: Send + Sync {
    /// 使用按位置排列的参数构造实例
    fn construct(&self, args: Vec<Value>) -> ConstructResult;

    /// 类名（用于错误信息）
    fn class_name(&self) -> &str;
}

/// 函数式类工厂
pub struct FnClassFactory<F> {
    factory_fn: F,
    class_name: String,
}

impl<F> FnClassFactory<F> {
    pub fn new(class_name: impl Into<String>, factory_fn: F) -> Self {
        Self {
            factory_fn,
            class_name: class_name.into(),
        }
    }
}

impl<F> ClassFactory for FnClassFactory<F>
where
    F: Fn(Vec<Value>) -> ConstructResult + Send + Sync + 'static,
{
    fn construct(&self, args: Vec<Value>) -> ConstructResult {
        (self.factory_fn)(args)
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// 类工厂注册表
#[derive(Default)]
pub struct ClassRegistry {
    factories: DashMap<String, Arc<dyn ClassFactory>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册返回任意值的工厂
    pub fn register<F>(&self, class_name: impl Into<String>, factory: F)
    where
        F: Fn(Vec<Value>) -> ConstructResult + Send + Sync + 'static,
    {
        let class_name = class_name.into();
        debug!(class = %class_name, "Registering class factory");
        let factory: Arc<dyn ClassFactory> =
            Arc::new(FnClassFactory::new(class_name.clone(), factory));
        self.factories.insert(class_name, factory);
    }

    /// 注册构造对象的工厂 - 便捷方法
    pub fn register_object<T, F>(&self, class_name: impl Into<String>, factory: F)
    where
        T: Injectable,
        F: Fn(Vec<Value>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(class_name, move |args| {
            factory(args).map(|object| Value::Object(crate::value::Instance::new(object)))
        });
    }

    /// 检查类是否已注册
    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 构造实例
    ///
    /// 构造函数失败时返回 `ConstructionFailed` 并保留底层错误。
    pub fn construct(&self, class_name: &str, args: Vec<Value>) -> Result<Value, BuildError> {
        // 先克隆出工厂，避免在用户代码执行期间持有分片锁
        let factory = self
            .factories
            .get(class_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BuildError::UnknownClass(class_name.to_string()))?;

        trace!(class = %class_name, arg_count = args.len(), "Constructing instance");
        factory
            .construct(args)
            .map_err(|source| BuildError::ConstructionFailed {
                class_name: factory.class_name().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_passes_arguments_in_order() {
        let registry = ClassRegistry::new();
        registry.register("Pair", |args| Ok(Value::List(args)));

        let value = registry
            .construct("Pair", vec![Value::Int(1), Value::from("two")])
            .unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::from("two")]));
    }

    #[test]
    fn test_unknown_class() {
        let registry = ClassRegistry::new();
        let result = registry.construct("Missing", vec![]);
        assert!(matches!(result, Err(BuildError::UnknownClass(name)) if name == "Missing"));
    }

    #[test]
    fn test_construction_failure_keeps_cause() {
        let registry = ClassRegistry::new();
        registry.register("Broken", |_| Err("disk full".into()));

        match registry.construct("Broken", vec![]) {
            Err(BuildError::ConstructionFailed { class_name, source }) => {
                assert_eq!(class_name, "Broken");
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
