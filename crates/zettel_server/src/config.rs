use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use zettel_core::LogTarget;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const HOST: &str = "ZETTEL_HOST";
    pub const PORT: &str = "ZETTEL_PORT";
    /// Path of the SQLite file, or `:memory:` for a throwaway database.
    pub const DATABASE: &str = "ZETTEL_DATABASE";
    pub const LOG_LEVEL: &str = "ZETTEL_LOG_LEVEL";
    /// Absolute directory for rotating log files. Unset logs to stderr.
    pub const LOG_DIR: &str = "ZETTEL_LOG_DIR";
}

/// Default values
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8000;
    pub const DATABASE: &str = "zettelkasten.db";
}

/// Invalid environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort(value) => {
                write!(f, "{} must be a port number, got `{value}`", env_vars::PORT)
            }
            Self::InvalidLogDir(message) => write!(f, "{}: {message}", env_vars::LOG_DIR),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub log_level: String,
    pub log_target: LogTarget,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get(env_vars::PORT) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => defaults::PORT,
        };
        let log_target = LogTarget::from_dir(get(env_vars::LOG_DIR).as_deref())
            .map_err(ConfigError::InvalidLogDir)?;

        Ok(Self {
            host: get(env_vars::HOST).unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            database: get(env_vars::DATABASE).unwrap_or_else(|| defaults::DATABASE.to_string()),
            log_level: get(env_vars::LOG_LEVEL)
                .unwrap_or_else(|| zettel_core::default_log_level().to_string()),
            log_target,
        })
    }
}
