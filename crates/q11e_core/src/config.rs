//! Runtime configuration resolved from environment variables.
//!
//! | variable          | default               |
//! |-------------------|-----------------------|
//! | `Q11E_DB_PATH`    | `q11e.sqlite3`        |
//! | `Q11E_LOG_LEVEL`  | `default_log_level()` |
//! | `Q11E_LOG_DIR`    | unset (no file logs)  |

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "Q11E_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "Q11E_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "Q11E_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "q11e.sqlite3";
const KNOWN_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but blank.
    Empty(&'static str),
    UnsupportedLogLevel(String),
    /// `Q11E_LOG_DIR` must be absolute.
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "environment variable {name} is set but empty"),
            Self::UnsupportedLogLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "{ENV_LOG_DIR} must be an absolute path, got `{dir}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Q11eConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is skipped when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for Q11eConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl Q11eConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = non_empty(&lookup, ENV_DB_PATH)? {
            config.db_path = PathBuf::from(path);
        }

        if let Some(level) = non_empty(&lookup, ENV_LOG_LEVEL)? {
            let normalized = level.to_ascii_lowercase();
            if !KNOWN_LOG_LEVELS.contains(&normalized.as_str()) {
                return Err(ConfigError::UnsupportedLogLevel(level));
            }
            config.log_level = normalized;
        }

        if let Some(dir) = non_empty(&lookup, ENV_LOG_DIR)? {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }
}

fn non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<String>, ConfigError> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}
