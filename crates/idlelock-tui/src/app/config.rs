//! TUI configuration persistence
//!
//! Saves and loads the idle timeout, fallback policy and PIN settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use idlelock_core::{FallbackPolicy, LockConfig, DEFAULT_PROMPT, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// PIN file name, next to the configuration
const PIN_FILE_NAME: &str = "pin.json";

/// Configuration directory under ~/.config
const CONFIG_DIR_NAME: &str = "idlelock";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "IDLELOCK_CONFIG";

/// TUI configuration that persists across sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TuiConfig {
    /// Idle period before the lock engages, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// What happens when an unlock cannot be challenged
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Text shown on the PIN prompt
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Wrong PINs accepted within one unlock attempt
    #[serde(default = "default_max_pin_attempts")]
    pub max_pin_attempts: u32,

    /// Custom PIN file location
    #[serde(default)]
    pub pin_file: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_max_pin_attempts() -> u32 {
    5
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            fallback: FallbackPolicy::default(),
            prompt: default_prompt(),
            max_pin_attempts: default_max_pin_attempts(),
            pin_file: None,
        }
    }
}

impl TuiConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        // Try XDG_CONFIG_HOME first, then fall back to ~/.config
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME));
        }

        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
    }

    /// Get the default config file path
    ///
    /// `IDLELOCK_CONFIG` is applied by the command line parser, ahead of this.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Self::config_dir()
            .map(|d| d.join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load configuration from `path`, writing the defaults there on first run
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Ok(Self::load(path));
        }

        let config = Self::default();
        config.save(path)?;
        tracing::info!("Created default config at {:?}", path);
        Ok(config)
    }

    /// Load configuration from `path`
    ///
    /// Returns default configuration if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
            }
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, contents).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Where the PIN hash lives
    ///
    /// A configured `pin_file` wins; otherwise the file sits next to `config_path`.
    pub fn pin_path(&self, config_path: &Path) -> PathBuf {
        match &self.pin_file {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .map(|dir| dir.join(PIN_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(PIN_FILE_NAME)),
        }
    }

    /// Idle timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build the lock configuration for the provider
    pub fn lock_config(&self) -> LockConfig {
        LockConfig::default()
            .with_timeout(self.timeout())
            .with_fallback(self.fallback)
            .with_prompt(self.prompt.clone())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TuiConfig::default();
        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.fallback, FallbackPolicy::Unlock);
        assert_eq!(config.max_pin_attempts, 5);
        assert!(config.pin_file.is_none());
        assert_eq!(config.lock_config(), LockConfig::default());
    }

    #[test]
    fn test_config_round_trip_on_disk() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = TuiConfig {
            timeout_ms: 60_000,
            fallback: FallbackPolicy::StayLocked,
            prompt: "Who goes there?".to_string(),
            max_pin_attempts: 3,
            pin_file: Some(PathBuf::from("/run/secrets/pin.json")),
        };
        config.save(&path).unwrap();

        assert_eq!(TuiConfig::load(&path), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "timeout_ms": 1500, "fallback": "stay_locked" }"#).unwrap();

        let config = TuiConfig::load(&path);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.fallback, FallbackPolicy::StayLocked);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert_eq!(config.max_pin_attempts, 5);
    }

    #[test]
    fn test_corrupt_or_missing_file_falls_back_to_default() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        assert_eq!(TuiConfig::load(&path), TuiConfig::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(TuiConfig::load(&path), TuiConfig::default());
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("idlelock").join("config.json");

        let config = TuiConfig::load_or_create(&path).unwrap();
        assert_eq!(config, TuiConfig::default());
        assert!(path.exists());

        // An existing file is read, not overwritten
        fs::write(&path, r#"{ "timeout_ms": 9000 }"#).unwrap();
        let config = TuiConfig::load_or_create(&path).unwrap();
        assert_eq!(config.timeout_ms, 9000);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{ "timeout_ms": 9000 }"#
        );
    }

    #[test]
    fn test_pin_path() {
        let config = TuiConfig::default();
        assert_eq!(
            config.pin_path(Path::new("/home/me/.config/idlelock/config.json")),
            PathBuf::from("/home/me/.config/idlelock/pin.json")
        );

        let config = TuiConfig {
            pin_file: Some(PathBuf::from("/tmp/custom.json")),
            ..TuiConfig::default()
        };
        assert_eq!(
            config.pin_path(Path::new("/anything/config.json")),
            PathBuf::from("/tmp/custom.json")
        );
    }
}
