//! Runtime configuration for processes embedding the core.
//!
//! # Responsibility
//! - Resolve database and logging settings from the environment, after
//!   loading an optional `.env` file.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Set-but-invalid values are errors, never silently defaulted.

use crate::db::DbOptions;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "CMS_DB_PATH";
pub const ENV_DB_BUSY_TIMEOUT_MS: &str = "CMS_DB_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "CMS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CMS_LOG_DIR";

const DEFAULT_DB_PATH: &str = "cms.sqlite3";

/// Settings for opening the store and starting logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: DbOptions::default().busy_timeout,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal; variables may come from the shell.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = get(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from);

        let busy_timeout = match get(ENV_DB_BUSY_TIMEOUT_MS) {
            Some(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_DB_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: "expected a non-negative integer of milliseconds",
                })?;
                Duration::from_millis(millis)
            }
            None => defaults.busy_timeout,
        };

        let log_level = get(ENV_LOG_LEVEL)
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.log_level);

        let log_dir = match get(ENV_LOG_DIR) {
            Some(raw) => {
                let dir = PathBuf::from(raw.trim());
                if !dir.is_absolute() {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LOG_DIR,
                        value: raw,
                        reason: "expected an absolute path",
                    });
                }
                Some(dir)
            }
            None => None,
        };

        Ok(Self {
            db_path,
            busy_timeout,
            log_level,
            log_dir,
        })
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: self.busy_timeout,
        }
    }
}
