//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "./quote-settings.db";
const DEFAULT_TTL_SECS: &str = "60";

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(ConfigError::InvalidValue("QUOTE_LOG_FORMAT".to_string())),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SQLite file holding admin settings
    pub db_path: PathBuf,

    /// How long fetched admin settings are reused
    pub settings_ttl: Duration,

    /// Log output style (stderr)
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("QUOTE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        if db_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue("QUOTE_DB_PATH".to_string()));
        }

        let ttl_secs: u64 = lookup("QUOTE_SETTINGS_TTL_SECS")
            .unwrap_or_else(|| DEFAULT_TTL_SECS.to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("QUOTE_SETTINGS_TTL_SECS".to_string()))?;

        let log_format = match lookup("QUOTE_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(CliConfig {
            db_path: PathBuf::from(db_path),
            settings_ttl: Duration::from_secs(ttl_secs),
            log_format,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
