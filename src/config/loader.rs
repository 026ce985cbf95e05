use std::{collections::HashMap, env, fs, path::Path, path::PathBuf};
use crate::errors::ConfigError;

use super::app_config::{
    AppConfig, PartialAppConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_PREFIX,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader reading the default services file
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Create a config loader for an explicit file; `~` is expanded
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Default services file under the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Path this loader reads from, if one can be determined
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => {
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                Some(PathBuf::from(expanded))
            }
            None => Self::default_path(),
        }
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let partial_config = match self.config_path() {
            // An explicit file must exist; the default one is optional
            Some(path) if self.path.is_some() || path.exists() => {
                Some(self.load_partial_config(&path)?)
            }
            _ => {
                tracing::debug!("No services file found, using defaults");
                None
            }
        };

        let env_map = self.collect_env_vars();
        AppConfig::from_partial_and_env(partial_config, env_map)
    }

    /// Load partial configuration, choosing JSON or TOML by file extension
    fn load_partial_config(&self, config_path: &Path) -> Result<PartialAppConfig, ConfigError> {
        let path_display = config_path.to_string_lossy().to_string();
        let content = fs::read_to_string(config_path)
            .map_err(|e| ConfigError::FileRead(path_display.clone(), e))?;

        let is_json = config_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let partial_config = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| ConfigError::JsonParse(path_display.clone(), e))?
        } else {
            toml::from_str(&content)
                .map_err(|e| ConfigError::TomlParse(path_display.clone(), e))?
        };

        tracing::info!(path = %path_display, "Loaded services configuration");
        Ok(partial_config)
    }

    /// Collect DIFORGE_* environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(temp_dir.path().join("absent.toml"));
        assert!(matches!(loader.load_config(), Err(ConfigError::FileRead(..))));
    }

    #[test]
    fn test_json_file_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("services.json");
        fs::write(
            &path,
            r#"{"services": {"clock": {"class": "Clock", "shared": true}}}"#,
        )
        .unwrap();

        let partial = ConfigLoader::with_path(path.clone())
            .load_partial_config(&path)
            .unwrap();
        let config = AppConfig::from_partial_and_env(Some(partial), HashMap::new()).unwrap();
        assert!(config.services["clock"].shared);
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("services.toml");
        fs::write(&path, "[services.clock\nclass = ").unwrap();

        let result = ConfigLoader::with_path(path.clone()).load_partial_config(&path);
        assert!(matches!(result, Err(ConfigError::TomlParse(..))));
    }

    #[test]
    fn test_tilde_expansion() {
        let loader = ConfigLoader::with_path(PathBuf::from("~/diforge/services.toml"));
        let path = loader.config_path().unwrap();
        if let Some(home) = dirs::home_dir() {
            assert!(path.starts_with(home));
        }
        assert!(path.ends_with("diforge/services.toml"));
    }
}
