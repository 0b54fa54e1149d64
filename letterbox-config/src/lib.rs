// Configuration management for Letterbox

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{SMTP_SECURITY_MODES, Settings};
pub use validation::{ConfigValidator, Validate};

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Environment prefix for Letterbox settings.
pub const ENV_PREFIX: &str = "LETTERBOX";

/// Environment variable naming an optional settings file.
pub const CONFIG_FILE_VAR: &str = "LETTERBOX_CONFIG";

/// Main configuration manager
///
/// Later loads override earlier ones key by key.
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix.into()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, serde_json::Value>> {
        self.config.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, serde_json::Value>> {
        self.config.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.merge_strings(loader.load());
    }

    /// Load configuration from an explicit variable set
    pub fn load_vars<I>(&self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.merge_strings(loader.load_from(vars));
    }

    fn merge_strings(&self, vars: HashMap<String, String>) {
        let mut config = self.write();
        for (key, value) in vars {
            config.insert(key, serde_json::Value::String(value));
        }
    }

    /// Load configuration from .env file, then the environment
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path)?;
            }
            None => {
                // A missing default .env is fine
                if let Ok(found) = dotenvy::dotenv() {
                    debug!(path = %found.display(), "loaded .env file");
                }
            }
        }
        self.load_env();
        Ok(())
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;
        self.merge_value(data);
        debug!(path = %path.display(), "loaded configuration file");
        Ok(())
    }

    fn merge_value(&self, data: serde_json::Value) {
        if let serde_json::Value::Object(map) = data {
            let mut config = self.write();
            for (key, value) in map {
                config.insert(key, value);
            }
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let config = self.read();

        let value = config
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::DeserializationError(format!("{}: {}", key, e)))
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Deserialize the whole map and validate it
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let json_value = serde_json::Value::Object(
            self.read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let validated: T = serde_json::from_value(json_value)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        validated.validate()?;

        Ok(validated)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Load settings from `LETTERBOX_CONFIG`, `.env` and `LETTERBOX_*` variables.
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Like [`Settings::load`], with the settings file given explicitly.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let manager = ConfigManager::with_prefix(ENV_PREFIX);

        if let Some(path) = file {
            let data = ConfigLoader::auto(path)?.load_file(path)?;
            manager.merge_value(data);
            debug!(path = %path.display(), "loaded settings file");
        }

        manager.load_dotenv(None)?;
        manager.load_validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_set_and_get() {
        let manager = ConfigManager::new();
        manager.set("sender_name", "Ops Desk").unwrap();

        let value: String = manager.get("sender_name").unwrap();
        assert_eq!(value, "Ops Desk");
        assert!(manager.has("sender_name"));
        assert!(!manager.has("missing_key"));
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();
        let value: u16 = manager.get_or("smtp_port", 465);
        assert_eq!(value, 465);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letterbox.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "smtp_host = \"file.example.com\"").unwrap();
        writeln!(file, "smtp_port = 2525").unwrap();
        writeln!(file, "sender_accounts = \"ops@example.com|pw\"").unwrap();

        let manager = ConfigManager::with_prefix(ENV_PREFIX);
        manager.load_file(&path, FileFormat::Toml).unwrap();
        manager.load_vars(vec![
            ("LETTERBOX_SMTP_HOST".to_string(), "env.example.com".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);

        let settings: Settings = manager.load_validated().unwrap();
        assert_eq!(settings.smtp_host, "env.example.com");
        assert_eq!(settings.smtp_port, 2525);
        assert_eq!(settings.timezone, "Asia/Taipei");
        assert!(!manager.has("unrelated"));
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let manager = ConfigManager::with_prefix(ENV_PREFIX);
        manager.load_vars(vec![
            (
                "LETTERBOX_SENDER_ACCOUNTS".to_string(),
                "ops@example.com|pw".to_string(),
            ),
            ("LETTERBOX_SMTP_PORT".to_string(), "0".to_string()),
        ]);

        let result: Result<Settings> = manager.load_validated();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
