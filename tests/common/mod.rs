//! 集成测试共用的测试对象

#![allow(dead_code)]

use diforge::transaction::{Connection, ConnectionError};
use diforge::{ClassRegistry, Injectable, InvokeError, Value, Visibility};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// 日志对象：一个公共属性 `prefix`，一个私有属性 `handle`
#[derive(Debug, Default)]
pub struct Logger {
    pub file: String,
    pub level: i64,
    pub set_level_calls: usize,
    pub prefix: String,
    handle: i64,
}

impl Logger {
    pub fn handle(&self) -> i64 {
        self.handle
    }
}

impl Injectable for Logger {
    fn class_name(&self) -> &str {
        "Logger"
    }

    fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, InvokeError> {
        match method {
            "setLevel" => {
                let level = args
                    .first()
                    .and_then(Value::as_int)
                    .ok_or_else(|| InvokeError::InvalidArgument("setLevel expects an integer".into()))?;
                self.level = level;
                self.set_level_calls += 1;
                Ok(Value::Null)
            }
            other => Err(InvokeError::UnknownMethod(other.to_string())),
        }
    }

    fn visibility(&self, property: &str) -> Option<Visibility> {
        match property {
            "prefix" => Some(Visibility::Public),
            "handle" => Some(Visibility::Private),
            _ => None,
        }
    }

    fn assign(&mut self, property: &str, value: Value) -> Result<(), InvokeError> {
        match property {
            "prefix" => {
                self.prefix = value
                    .as_str()
                    .ok_or_else(|| InvokeError::InvalidArgument("prefix expects a string".into()))?
                    .to_string();
                Ok(())
            }
            "handle" => {
                self.handle = value.as_int().unwrap_or_default();
                Ok(())
            }
            other => Err(InvokeError::UnknownProperty(other.to_string())),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 记录构造参数的对象
#[derive(Debug)]
pub struct Recorder {
    pub args: Vec<Value>,
}

impl Injectable for Recorder {
    fn class_name(&self) -> &str {
        "Recorder"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 注册测试用的类工厂
///
/// - `Logger(file?)`
/// - `Recorder(..)` 保存全部参数
/// - `Clock` 无参对象
/// - `Answer` 返回整数 42（非对象）
/// - `Broken` 构造总是失败
pub fn registry() -> Arc<ClassRegistry> {
    let registry = ClassRegistry::new();
    registry.register_object("Logger", |args: Vec<Value>| {
        let file = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Logger {
            file,
            ..Logger::default()
        })
    });
    registry.register_object("Recorder", |args| Ok(Recorder { args }));
    registry.register_object("Clock", |_| Ok(Recorder { args: Vec::new() }));
    registry.register("Answer", |_| Ok(Value::Int(42)));
    registry.register("Broken", |_| Err("disk on fire".into()));
    Arc::new(registry)
}

/// 取出 Recorder 保存的构造参数
pub fn recorded_args(value: &Value) -> Vec<Value> {
    value
        .as_object()
        .and_then(|instance| instance.with(|recorder: &Recorder| recorder.args.clone()))
        .expect("value is a Recorder")
}

/// 可控事务状态的模拟连接
#[derive(Debug, Default)]
pub struct MockConnection {
    under_transaction: AtomicBool,
    fail_commits: AtomicBool,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockConnection {
    pub fn set_under_transaction(&self, value: bool) {
        self.under_transaction.store(value, Ordering::SeqCst);
    }

    /// Make every later commit fail and leave the transaction open.
    pub fn set_fail_commits(&self, value: bool) {
        self.fail_commits.store(value, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl Connection for MockConnection {
    fn begin(&self) -> Result<(), ConnectionError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.set_under_transaction(true);
        Ok(())
    }

    fn commit(&self) -> Result<(), ConnectionError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(ConnectionError::new("deadlock detected"));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.set_under_transaction(false);
        Ok(())
    }

    fn rollback(&self) -> Result<(), ConnectionError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.set_under_transaction(false);
        Ok(())
    }

    fn close(&self) -> Result<(), ConnectionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_under_transaction(&self) -> bool {
        self.under_transaction.load(Ordering::SeqCst)
    }
}
