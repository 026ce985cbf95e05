use crate::infrastructure::builder::BuildError;
use crate::infrastructure::container::ContainerError;
use crate::transaction::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Failed to parse JSON from file '{0}': {1}")]
    JsonParse(String, #[source] serde_json::Error),
    #[error("Invalid service '{name}': {reason}")]
    InvalidService { name: String, reason: String },
    #[error("Invalid value '{value}' for environment variable {key}")]
    InvalidEnv { key: String, value: String },
    #[error("Other Config Error: {0}")]
    Other(String),
}

/// Creates an AppError::Config with a ConfigError::Other
pub fn config_error(msg: impl Into<String>) -> AppError {
    AppError::Config(ConfigError::Other(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: AppError = ConfigError::InvalidEnv {
            key: "DIFORGE_LOG_FORMAT".to_string(),
            value: "xml".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value 'xml' for environment variable DIFORGE_LOG_FORMAT"
        );

        let err: AppError = BuildError::MissingClassName.into();
        assert!(matches!(err, AppError::Build(BuildError::MissingClassName)));

        let err = config_error("bad");
        assert_eq!(err.to_string(), "Configuration error: Other Config Error: bad");
    }
}
