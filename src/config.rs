use crate::errors::{AppError, AppResult, ErrorContextExt};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the config file, relative to a project root or home
pub const CONFIG_DIR: &str = ".errbrake";
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_ENDPOINT: &str = "ERRBRAKE_ENDPOINT";
pub const ENV_PROJECT_ID: &str = "ERRBRAKE_PROJECT_ID";
pub const ENV_PROJECT_KEY: &str = "ERRBRAKE_PROJECT_KEY";
pub const ENV_ENVIRONMENT: &str = "ERRBRAKE_ENVIRONMENT";
pub const ENV_TIMEOUT_SECS: &str = "ERRBRAKE_TIMEOUT_SECS";

/// Keys accepted by [`Config::get_value`] and [`Config::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "notifier.endpoint",
    "notifier.project_id",
    "notifier.project_key",
    "notifier.environment",
    "notifier.timeout_secs",
    "reporting.remote_enabled",
    "reporting.expected_kinds",
    "logging.level",
    "logging.log_path",
];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the remote collector
///
/// Immutable once handed to [`NotifierClient::configure`](crate::clients::NotifierClient::configure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub endpoint: String,
    pub project_id: String,
    pub project_key: String,
    pub environment: String,
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            project_id: String::new(),
            project_key: String::new(),
            environment: default_environment(),
            timeout: default_timeout(),
        }
    }
}

impl NotifierConfig {
    /// True when all three required fields carry a value
    pub fn is_complete(&self) -> bool {
        [&self.endpoint, &self.project_id, &self.project_key]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

/// What gets reported and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Kinds the application anticipates; reports of these kinds are tagged expected
    #[serde(default)]
    pub expected_kinds: Vec<String>,
    /// Forward reports to the collector when the notifier is configured
    #[serde(default = "default_remote_enabled")]
    pub remote_enabled: bool,
    /// Static context added to every report sent to the collector
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            expected_kinds: Vec::new(),
            remote_enabled: default_remote_enabled(),
            context: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Daily-rolling log file; console only when unset
    #[serde(default)]
    pub log_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_path: None,
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_remote_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl Config {
    /// Apply `ERRBRAKE_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ENDPOINT) {
            self.notifier.endpoint = value;
        }
        if let Some(value) = lookup(ENV_PROJECT_ID) {
            self.notifier.project_id = value;
        }
        if let Some(value) = lookup(ENV_PROJECT_KEY) {
            self.notifier.project_key = value;
        }
        if let Some(value) = lookup(ENV_ENVIRONMENT) {
            self.notifier.environment = value;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.notifier.timeout = parse_timeout(ENV_TIMEOUT_SECS, &value)?;
        }
        Ok(())
    }

    /// Read a single value by dotted key
    pub fn get_value(&self, key: &str) -> AppResult<String> {
        let value = match key {
            "notifier.endpoint" => self.notifier.endpoint.clone(),
            "notifier.project_id" => self.notifier.project_id.clone(),
            "notifier.project_key" => self.notifier.project_key.clone(),
            "notifier.environment" => self.notifier.environment.clone(),
            "notifier.timeout_secs" => self.notifier.timeout.as_secs().to_string(),
            "reporting.remote_enabled" => self.reporting.remote_enabled.to_string(),
            "reporting.expected_kinds" => self.reporting.expected_kinds.join(","),
            "logging.level" => self.logging.level.clone(),
            "logging.log_path" => self
                .logging
                .log_path
                .clone()
                .unwrap_or_else(|| "None".to_string()),
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        };
        Ok(value)
    }

    /// Set a single value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> AppResult<()> {
        match key {
            "notifier.endpoint" => self.notifier.endpoint = value.to_string(),
            "notifier.project_id" => self.notifier.project_id = value.to_string(),
            "notifier.project_key" => self.notifier.project_key = value.to_string(),
            "notifier.environment" => self.notifier.environment = value.to_string(),
            "notifier.timeout_secs" => self.notifier.timeout = parse_timeout(key, value)?,
            "reporting.remote_enabled" => {
                self.reporting.remote_enabled =
                    value.parse().map_err(|e| AppError::InvalidConfigValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        source: Some(Box::new(e)),
                    })?
            }
            "reporting.expected_kinds" => {
                self.reporting.expected_kinds = value
                    .split(',')
                    .map(str::trim)
                    .filter(|kind| !kind.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "logging.level" => self.logging.level = value.to_string(),
            "logging.log_path" => {
                self.logging.log_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            _ => return Err(AppError::UnknownConfigKey { key: key.to_string() }),
        }
        Ok(())
    }
}

fn parse_timeout(key: &str, value: &str) -> AppResult<Duration> {
    let secs: u64 = value.trim().parse().map_err(|e| AppError::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
        source: Some(Box::new(e)),
    })?;
    if secs == 0 {
        return Err(AppError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
            source: None,
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration manager
///
/// Loads configuration from a project-level file, falling back to the global
/// file, falling back to defaults. Nothing is written to disk unless
/// [`ConfigManager::save`] is called.
///
/// # Configuration Hierarchy
///
/// 1. **Project-level**: `.errbrake/config.toml` in the project root
/// 2. **Global**: `~/.errbrake/config.toml`
/// 3. Built-in defaults
///
/// `ERRBRAKE_*` environment variables override whichever file was loaded.
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load configuration for an optional project root
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed,
    /// or if an environment override carries an invalid value.
    pub fn new(project_path: Option<PathBuf>) -> AppResult<Self> {
        let mut manager = Self::load_file(project_path)?;
        manager.config.apply_env_overrides()?;
        Ok(manager)
    }

    /// Load configuration without environment overrides
    pub fn load_file(project_path: Option<PathBuf>) -> AppResult<Self> {
        let config_path = match project_path {
            Some(path) => {
                let project_config = Self::get_config_path(Some(path))?;
                let global_config = Self::get_config_path(None).ok();
                match global_config {
                    Some(global) if !project_config.exists() && global.exists() => global,
                    _ => project_config,
                }
            }
            None => Self::get_config_path(None)?,
        };

        let config = Self::load(&config_path)?;
        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    /// Manager that always targets the project-level file, even if a global one exists
    pub fn new_project_config(project_path: PathBuf) -> AppResult<Self> {
        let config_path = Self::get_config_path(Some(project_path))?;
        let config = Self::load(&config_path)?;
        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    /// Manager holding default values, bound to `config_path` without reading it
    pub fn with_defaults(config_path: PathBuf) -> Self {
        ConfigManager {
            config_path,
            config: Config::default(),
        }
    }

    /// Path of the project or global config file
    pub fn get_config_path(project_path: Option<PathBuf>) -> AppResult<PathBuf> {
        let base_path = if let Some(path) = project_path {
            path.join(CONFIG_DIR)
        } else {
            let base_dirs = BaseDirs::new()
                .ok_or_else(|| AppError::configuration("home", "failed to get base directories"))?;
            base_dirs.home_dir().join(CONFIG_DIR)
        };

        Ok(base_path.join(CONFIG_FILE))
    }

    fn load(path: &Path) -> AppResult<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).in_file_operation(path, "read config file")?;
        Ok(toml::from_str(&content)?)
    }

    /// Write the configuration to the file it was loaded from
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io_with_source(parent, "create config directory", e))?;
        }
        let content = toml::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, content)
            .map_err(|e| AppError::io_with_source(&self.config_path, "write config file", e))?;
        tracing::debug!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_with_defaults_ignores_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigManager::get_config_path(Some(temp_dir.path().to_path_buf())).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[notifier\nendpoint = ").unwrap();

        assert!(ConfigManager::load_file(Some(temp_dir.path().to_path_buf())).is_err());

        let manager = ConfigManager::with_defaults(path.clone());
        manager.save().unwrap();
        let reloaded = ConfigManager::load_file(Some(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(reloaded.config_path(), path.as_path());
        assert_eq!(reloaded.config().notifier, Config::default().notifier);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[notifier]"));
        assert!(text.contains("timeout_secs = 5"));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.notifier, config.notifier);
        assert!(parsed.reporting.remote_enabled);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [notifier]
            endpoint = "https://collector.example.com/notices"
            project_id = "144031"
            project_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.notifier.environment, "development");
        assert_eq!(parsed.notifier.timeout, Duration::from_secs(5));
        assert!(parsed.notifier.is_complete());
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://localhost:8080/notices"),
            (ENV_PROJECT_ID, "7"),
            (ENV_TIMEOUT_SECS, "2"),
        ]
        .into();
        let mut config = Config::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.notifier.endpoint, "http://localhost:8080/notices");
        assert_eq!(config.notifier.project_id, "7");
        assert_eq!(config.notifier.timeout, Duration::from_secs(2));
        assert!(!config.notifier.is_complete());
    }

    #[test]
    fn test_zero_timeout_override_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|name| (name == ENV_TIMEOUT_SECS).then(|| "0".to_string()));
        assert!(matches!(result, Err(AppError::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_set_and_get_values() {
        let mut config = Config::default();
        config.set_value("reporting.expected_kinds", "EOF, FileNotFound,").unwrap();
        assert_eq!(config.reporting.expected_kinds, vec!["EOF", "FileNotFound"]);
        assert_eq!(config.get_value("reporting.expected_kinds").unwrap(), "EOF,FileNotFound");

        config.set_value("notifier.timeout_secs", "12").unwrap();
        assert_eq!(config.get_value("notifier.timeout_secs").unwrap(), "12");

        assert!(config.set_value("reporting.remote_enabled", "maybe").is_err());
        assert!(matches!(
            config.get_value("notifier.secret"),
            Err(AppError::UnknownConfigKey { .. })
        ));
        for key in CONFIG_KEYS {
            assert!(config.get_value(key).is_ok(), "key {key} should be readable");
        }
    }

    #[test]
    fn test_save_and_reload_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        assert!(!manager.config_path().exists());

        manager.config_mut().notifier.project_id = "123".to_string();
        manager.save().unwrap();
        assert!(temp_dir.path().join(".errbrake/config.toml").exists());

        let reloaded = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.config().notifier.project_id, "123");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), "[notifier\nendpoint = ").unwrap();

        let result = ConfigManager::new_project_config(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(AppError::TomlParsing { .. })));
    }
}
