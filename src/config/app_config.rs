use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::Level;

use super::loader::ConfigLoader;
use crate::errors::ConfigError;
use crate::infrastructure::builder::ServiceDefinition;
use crate::infrastructure::container::ServiceSource;
use crate::logging::{LogFormat, LoggingConfig, LoggingEnvironment};
use crate::transaction::DEFAULT_DB_SERVICE;

// Configuration location constants
pub const CONFIG_DIR_NAME: &str = "diforge";
pub const CONFIG_FILE_NAME: &str = "services.toml";

// Environment overrides
pub const ENV_PREFIX: &str = "DIFORGE_";
pub const ENV_LOG_LEVEL: &str = "DIFORGE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "DIFORGE_LOG_FORMAT";
pub const ENV_DB_SERVICE: &str = "DIFORGE_DB_SERVICE";
pub const ENV_ROLLBACK_PENDENT: &str = "DIFORGE_ROLLBACK_PENDENT";

/// Main Application Configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub transactions: TransactionConfig,
    pub services: BTreeMap<String, ServiceEntry>,
}

/// Transaction manager settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Database service new transactions are opened against
    pub db_service: String,
    /// Roll back pending transactions when the manager is dropped
    pub rollback_pendent: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            db_service: DEFAULT_DB_SERVICE.to_string(),
            rollback_pendent: true,
        }
    }
}

/// How a configured service is produced
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEntryKind {
    Class(String),
    Definition(ServiceDefinition),
}

/// A service declared in the configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEntry {
    pub shared: bool,
    pub kind: ServiceEntryKind,
}

impl ServiceEntry {
    pub fn source(&self) -> ServiceSource {
        match &self.kind {
            ServiceEntryKind::Class(class_name) => ServiceSource::Class(class_name.clone()),
            ServiceEntryKind::Definition(definition) => {
                ServiceSource::Definition(definition.clone())
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ServiceEntryKind::Class(_) => "class",
            ServiceEntryKind::Definition(_) => "definition",
        }
    }

    pub fn class_name(&self) -> &str {
        match &self.kind {
            ServiceEntryKind::Class(class_name) => class_name,
            ServiceEntryKind::Definition(definition) => &definition.class_name,
        }
    }

    pub fn service_references(&self) -> Vec<&str> {
        match &self.kind {
            ServiceEntryKind::Class(_) => Vec::new(),
            ServiceEntryKind::Definition(definition) => definition.service_references(),
        }
    }
}

/// A service reference that names no configured service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub service: String,
    pub reference: String,
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    logging: Option<PartialLoggingConfig>,
    transactions: Option<PartialTransactionConfig>,
    services: Option<BTreeMap<String, PartialServiceEntry>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialLoggingConfig {
    environment: Option<LoggingEnvironment>,
    level: Option<String>,
    format: Option<LogFormat>,
    show_target: Option<bool>,
    show_thread_ids: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTransactionConfig {
    db_service: Option<String>,
    rollback_pendent: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct PartialServiceEntry {
    #[serde(default)]
    shared: bool,
    class: Option<String>,
    definition: Option<ServiceDefinition>,
}

impl AppConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration from a specific file and environment
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_path(path).load_config()
    }

    /// Create AppConfig from partial config and environment
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let logging = Self::resolve_logging(partial.logging.unwrap_or_default(), &env_map)?;
        let transactions =
            Self::resolve_transactions(partial.transactions.unwrap_or_default(), &env_map)?;

        let mut services = BTreeMap::new();
        for (name, entry) in partial.services.unwrap_or_default() {
            let kind = match (entry.class, entry.definition) {
                (Some(class_name), None) if !class_name.is_empty() => {
                    ServiceEntryKind::Class(class_name)
                }
                (None, Some(definition)) => ServiceEntryKind::Definition(definition),
                (Some(_), Some(_)) => {
                    return Err(ConfigError::InvalidService {
                        name,
                        reason: "'class' and 'definition' are mutually exclusive".to_string(),
                    })
                }
                _ => {
                    return Err(ConfigError::InvalidService {
                        name,
                        reason: "either 'class' or 'definition' is required".to_string(),
                    })
                }
            };
            services.insert(
                name,
                ServiceEntry {
                    shared: entry.shared,
                    kind,
                },
            );
        }

        Ok(Self {
            logging,
            transactions,
            services,
        })
    }

    fn resolve_logging(
        partial: PartialLoggingConfig,
        env_map: &HashMap<String, String>,
    ) -> Result<LoggingConfig, ConfigError> {
        let mut logging = match partial.environment {
            Some(environment) => LoggingConfig::for_environment(environment),
            None => LoggingConfig::default(),
        };

        if let Some(level) = env_map.get(ENV_LOG_LEVEL) {
            logging.level = level.parse::<Level>().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_LOG_LEVEL.to_string(),
                value: level.clone(),
            })?;
        } else if let Some(level) = partial.level {
            logging.level = level
                .parse::<Level>()
                .map_err(|_| ConfigError::Other(format!("Invalid log level '{level}'")))?;
        }

        if let Some(format) = env_map.get(ENV_LOG_FORMAT) {
            logging.format = format.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_LOG_FORMAT.to_string(),
                value: format.clone(),
            })?;
        } else if let Some(format) = partial.format {
            logging.format = format;
        }

        if let Some(show_target) = partial.show_target {
            logging.show_target = show_target;
        }
        if let Some(show_thread_ids) = partial.show_thread_ids {
            logging.show_thread_ids = show_thread_ids;
        }
        Ok(logging)
    }

    fn resolve_transactions(
        partial: PartialTransactionConfig,
        env_map: &HashMap<String, String>,
    ) -> Result<TransactionConfig, ConfigError> {
        let defaults = TransactionConfig::default();

        let db_service = env_map
            .get(ENV_DB_SERVICE)
            .cloned()
            .or(partial.db_service)
            .unwrap_or(defaults.db_service);

        let rollback_pendent = match env_map.get(ENV_ROLLBACK_PENDENT) {
            Some(value) => parse_bool(value).ok_or_else(|| ConfigError::InvalidEnv {
                key: ENV_ROLLBACK_PENDENT.to_string(),
                value: value.clone(),
            })?,
            None => partial
                .rollback_pendent
                .unwrap_or(defaults.rollback_pendent),
        };

        Ok(TransactionConfig {
            db_service,
            rollback_pendent,
        })
    }

    /// Service references that name no configured service
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let mut unresolved = Vec::new();
        for (name, entry) in &self.services {
            for reference in entry.service_references() {
                if !self.services.contains_key(reference) {
                    unresolved.push(UnresolvedReference {
                        service: name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }
        unresolved
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(toml_src: &str) -> PartialAppConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::from_partial_and_env(None, HashMap::new()).unwrap();
        assert_eq!(config.transactions, TransactionConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = partial(
            r#"
            [logging]
            environment = "production"
            level = "warn"

            [transactions]
            db_service = "primary"
            "#,
        );
        let env = HashMap::from([
            (ENV_LOG_LEVEL.to_string(), "debug".to_string()),
            (ENV_DB_SERVICE.to_string(), "replica".to_string()),
            (ENV_ROLLBACK_PENDENT.to_string(), "off".to_string()),
        ]);

        let config = AppConfig::from_partial_and_env(Some(file), env).unwrap();
        assert_eq!(config.logging.environment, LoggingEnvironment::Production);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, Level::DEBUG);
        assert_eq!(config.transactions.db_service, "replica");
        assert!(!config.transactions.rollback_pendent);
    }

    #[test]
    fn test_invalid_env_value() {
        let env = HashMap::from([(ENV_LOG_FORMAT.to_string(), "xml".to_string())]);
        let result = AppConfig::from_partial_and_env(None, env);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { key, .. }) if key == ENV_LOG_FORMAT
        ));
    }

    #[test]
    fn test_service_entries() {
        let file = partial(
            r#"
            [services.clock]
            class = "Clock"
            shared = true

            [services.mailer.definition]
            className = "Mailer"
            arguments = [
                { type = "service", name = "transport" },
                { type = "service", name = "clock" },
            ]
            "#,
        );

        let config = AppConfig::from_partial_and_env(Some(file), HashMap::new()).unwrap();
        let clock = &config.services["clock"];
        assert!(clock.shared);
        assert_eq!(clock.kind, ServiceEntryKind::Class("Clock".to_string()));
        assert_eq!(config.services["mailer"].class_name(), "Mailer");
        assert_eq!(
            config.unresolved_references(),
            vec![UnresolvedReference {
                service: "mailer".to_string(),
                reference: "transport".to_string(),
            }]
        );
    }

    #[test]
    fn test_service_entry_requires_exactly_one_source() {
        let file = partial(
            r#"
            [services.broken]
            shared = true
            "#,
        );
        let result = AppConfig::from_partial_and_env(Some(file), HashMap::new());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidService { name, .. }) if name == "broken"
        ));
    }
}
