//! Application configuration.
//!
//! # Responsibility
//! - Load `AppConfig` from TOML, falling back to defaults per section.
//! - Apply `POCKETNOTES_*` environment overrides.
//!
//! # Invariants
//! - Backend credentials are never compiled in; everything comes from here.
//! - A config that passed `validate()` can build every collaborator.

use argon2::Params;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::logging::default_log_level;
use crate::store::DEFAULT_FEED_CAPACITY;

pub const ENV_DB_PATH: &str = "POCKETNOTES_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "POCKETNOTES_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "POCKETNOTES_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub hasher: HasherConfig,
    pub live_query: LiveQueryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HasherConfig {
    pub fn to_params(&self) -> ConfigResult<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|err| ConfigError::Invalid(format!("hasher params rejected: {err}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveQueryConfig {
    /// Undelivered change events a subscriber may fall behind before lagging.
    pub channel_capacity: usize,
}

impl Default for LiveQueryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Parses TOML text and validates the result.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(path) = read(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.live_query.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "live_query.channel_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "database.path must not be empty".to_string(),
                ));
            }
        }
        self.hasher.to_params()?;
        Ok(())
    }
}
