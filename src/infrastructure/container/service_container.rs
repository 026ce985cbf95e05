//! 服务容器实现
//!
//! - 按名称注册服务（类名 / 服务定义 / 工厂闭包 / 值）
//! - 单例服务首次解析后缓存
//! - 未注册但存在类工厂的名称直接按类构造
//! - 解析栈检测循环依赖

use super::{Container, ContainerError, Service, ServiceLifetime, ServiceSource};
use crate::config::AppConfig;
use crate::infrastructure::builder::{ArgumentDescriptor, InstanceBuilder};
use crate::infrastructure::factory::ClassRegistry;
use crate::logging::OperationTimer;
use crate::value::Value;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// 服务容器
#[derive(Clone)]
pub struct ServiceContainer {
    /// 服务注册表
    services: Arc<DashMap<String, Service>>,
    /// 共享实例缓存
    shared_instances: Arc<DashMap<String, Value>>,
    /// 实例构建器（持有类工厂注册表）
    builder: InstanceBuilder,
    /// 各线程正在解析的服务名称栈
    resolving: Arc<DashMap<ThreadId, Vec<String>>>,
    /// 最近一次解析是否创建了新实例
    fresh_instance: Arc<AtomicBool>,
    /// 容器统计信息（内部原子计数器）
    stats: Arc<InnerStats>,
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

/// 解析栈守卫，离开作用域时弹出服务名称
struct ResolutionGuard<'a> {
    stacks: &'a DashMap<ThreadId, Vec<String>>,
    thread: ThreadId,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let emptied = match self.stacks.get_mut(&self.thread) {
            Some(mut stack) => {
                stack.pop();
                stack.is_empty()
            }
            None => false,
        };
        if emptied {
            self.stacks.remove_if(&self.thread, |_, stack| stack.is_empty());
        }
    }
}

impl ServiceContainer {
    /// 创建新的容器实例
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self {
            services: Arc::new(DashMap::new()),
            shared_instances: Arc::new(DashMap::new()),
            builder: InstanceBuilder::new(classes),
            resolving: Arc::new(DashMap::new()),
            fresh_instance: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(InnerStats::default()),
        }
    }

    pub fn builder(&self) -> &InstanceBuilder {
        &self.builder
    }

    /// 注册服务，替换同名服务并丢弃其共享实例
    pub fn set(&self, name: impl Into<String>, source: impl Into<ServiceSource>) {
        self.register(name.into(), source.into(), ServiceLifetime::Transient);
    }

    /// 注册单例服务
    pub fn set_shared(&self, name: impl Into<String>, source: impl Into<ServiceSource>) {
        self.register(name.into(), source.into(), ServiceLifetime::Singleton);
    }

    /// 仅当名称未注册时注册服务，返回是否注册成功
    pub fn attempt(
        &self,
        name: impl Into<String>,
        source: impl Into<ServiceSource>,
        shared: bool,
    ) -> bool {
        let name = name.into();
        if self.services.contains_key(&name) {
            return false;
        }
        let lifetime = if shared {
            ServiceLifetime::Singleton
        } else {
            ServiceLifetime::Transient
        };
        self.register(name, source.into(), lifetime);
        true
    }

    fn register(&self, name: String, source: ServiceSource, lifetime: ServiceLifetime) {
        debug!(service = %name, kind = source.kind(), ?lifetime, "Registering service");
        self.shared_instances.remove(&name);
        self.services.insert(name.clone(), Service::new(name, source, lifetime));
    }

    /// 移除服务及其共享实例
    pub fn remove(&self, name: &str) -> Option<Service> {
        self.shared_instances.remove(name);
        self.services.remove(name).map(|(_, service)| service)
    }

    /// 获取已注册服务的副本
    pub fn service(&self, name: &str) -> Option<Service> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 修改服务定义的某个构造参数
    pub fn set_parameter(
        &self,
        name: &str,
        position: usize,
        descriptor: ArgumentDescriptor,
    ) -> Result<(), ContainerError> {
        let mut entry = self
            .services
            .get_mut(name)
            .ok_or_else(|| ContainerError::ServiceNotFound(name.to_string()))?;
        entry.set_parameter(position, descriptor)
    }

    /// 解析服务 - 主要API
    pub fn get(&self, name: &str, parameters: Option<Vec<Value>>) -> Result<Value, ContainerError> {
        self.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);

        // 克隆出服务，构建期间不持有注册表的分片锁
        let service = self.service(name);

        if let Some(service) = &service {
            if service.is_shared() {
                if let Some(instance) = self.shared_instances.get(name) {
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    self.fresh_instance.store(false, Ordering::Relaxed);
                    return Ok(instance.value().clone());
                }
            }
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        let _guard = self.enter(name)?;
        let timer = OperationTimer::new("container.resolve").with_metadata("service", name);

        let value = match service {
            Some(service) => {
                let value = service.resolve(self, parameters)?;
                if service.is_shared() {
                    self.shared_instances.insert(name.to_string(), value.clone());
                }
                value
            }
            None if self.builder.classes().contains(name) => self
                .builder
                .classes()
                .construct(name, parameters.unwrap_or_default())
                .map_err(|source| ContainerError::Build {
                    service: name.to_string(),
                    source: Box::new(source),
                })?,
            None => return Err(ContainerError::ServiceNotFound(name.to_string())),
        };

        timer.finish();
        self.fresh_instance.store(true, Ordering::Relaxed);
        Ok(value)
    }

    /// 解析服务并按名称缓存，无论服务是否声明为单例
    pub fn get_shared(
        &self,
        name: &str,
        parameters: Option<Vec<Value>>,
    ) -> Result<Value, ContainerError> {
        if let Some(instance) = self.shared_instances.get(name) {
            self.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.fresh_instance.store(false, Ordering::Relaxed);
            return Ok(instance.value().clone());
        }

        let value = self.get(name, parameters)?;
        self.shared_instances.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// 最近一次解析是否创建了新实例
    pub fn was_fresh_instance(&self) -> bool {
        self.fresh_instance.load(Ordering::Relaxed)
    }

    /// 检查服务是否已注册
    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// 注册配置文件中声明的服务
    pub fn load_services(&self, config: &AppConfig) {
        for (name, entry) in &config.services {
            let source = entry.source();
            if entry.shared {
                self.set_shared(name.clone(), source);
            } else {
                self.set(name.clone(), source);
            }
        }
        debug!(count = config.services.len(), "Loaded services from configuration");
    }

    fn enter(&self, name: &str) -> Result<ResolutionGuard<'_>, ContainerError> {
        let thread = thread::current().id();
        let mut stack = self.resolving.entry(thread).or_default();
        if stack.iter().any(|entry| entry == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(ContainerError::CircularDependency { chain });
        }
        stack.push(name.to_string());
        Ok(ResolutionGuard {
            stacks: &self.resolving,
            thread,
        })
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.stats.total_resolutions.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
        }
    }
}

impl Container for ServiceContainer {
    fn get(&self, name: &str, parameters: Option<Vec<Value>>) -> Result<Value, ContainerError> {
        ServiceContainer::get(self, name, parameters)
    }

    fn has(&self, name: &str) -> bool {
        ServiceContainer::has(self, name)
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new(Arc::new(ClassRegistry::new()))
    }
}

/// 容器统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStats {
    pub total_resolutions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ContainerStats {
    /// 获取总解析次数
    pub fn total(&self) -> usize {
        self.total_resolutions
    }

    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total() as f64
        }
    }
}
