//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::history::HistoryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Seen history writer and lookup settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Event engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
    /// Networks the bot is connected to, with the nickname it uses there.
    #[serde(default, rename = "network")]
    pub networks: Vec<NetworkConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "seen.db".to_string()
}

/// Event engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Inbound event queue capacity (default: 1024).
    #[serde(default = "default_event_queue")]
    pub event_queue: usize,
    /// Command name shown in the usage reply (default: "seen").
    #[serde(default = "default_command")]
    pub command: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_queue: default_event_queue(),
            command: default_command(),
        }
    }
}

fn default_event_queue() -> usize {
    1024
}

fn default_command() -> String {
    "seen".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// A network the bot is connected to.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Network identifier (e.g., "freenode"). Compared case-insensitively.
    pub name: String,
    /// The bot's own nickname on this network.
    pub nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, "seen.db");
        assert_eq!(config.engine.event_queue, 1024);
        assert_eq!(config.engine.command, "seen");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.networks.is_empty());
    }

    #[test]
    fn parses_networks_and_log_format() {
        let config: Config = toml::from_str(
            r#"
[log]
format = "json"

[[network]]
name = "freenode"
nickname = "[muffin]"

[[network]]
name = "libera"
nickname = "muffin"
"#,
        )
        .unwrap();

        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.networks[0].nickname, "[muffin]");
        assert_eq!(config.networks[1].name, "libera");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/ircseen.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
