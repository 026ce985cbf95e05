pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{
    AppConfig, PartialAppConfig, ServiceEntry, ServiceEntryKind, TransactionConfig,
    UnresolvedReference,
};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_DB_SERVICE, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_PREFIX, ENV_ROLLBACK_PENDENT,
};
