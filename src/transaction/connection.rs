//! Database connection seam used by transaction handles.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Error reported by a connection or a connection provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A database connection. Handles borrow it; they never own its lifecycle
/// beyond commit, rollback and close.
pub trait Connection: Send + Sync {
    fn begin(&self) -> Result<(), ConnectionError>;

    fn commit(&self) -> Result<(), ConnectionError>;

    fn rollback(&self) -> Result<(), ConnectionError>;

    fn close(&self) -> Result<(), ConnectionError>;

    fn is_under_transaction(&self) -> bool;
}

/// Supplies a connection for a logical database service name.
pub trait ConnectionProvider: Send + Sync {
    fn connection(&self, service: &str) -> Result<Arc<dyn Connection>, ConnectionError>;
}

type ConnectionFactory =
    Arc<dyn Fn() -> Result<Arc<dyn Connection>, ConnectionError> + Send + Sync>;

/// Name -> factory map; every request opens a fresh connection.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    factories: Arc<DashMap<String, ConnectionFactory>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, service: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn Connection>, ConnectionError> + Send + Sync + 'static,
    {
        let service = service.into();
        debug!(service = %service, "Registering connection factory");
        self.factories.insert(service, Arc::new(factory));
    }

    pub fn contains(&self, service: &str) -> bool {
        self.factories.contains_key(service)
    }
}

impl ConnectionProvider for ConnectionRegistry {
    fn connection(&self, service: &str) -> Result<Arc<dyn Connection>, ConnectionError> {
        let factory = self
            .factories
            .get(service)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                ConnectionError::new(format!(
                    "Service '{service}' wasn't found in the connection registry"
                ))
            })?;
        factory()
    }
}
