//! Server configuration.
//!
//! Values come from, lowest precedence first: built-in defaults, a TOML
//! file, `UNDEFINE_*` environment variables, then command-line flags.

use chrono::TimeDelta;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use undefine_game::GameRules;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "undefine.toml";

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Sessions untouched for this long are purged.
    #[serde(default = "default_session_idle_hours")]
    session_idle_hours: u32,

    /// How often the purge task runs.
    #[serde(default = "default_purge_interval_minutes")]
    purge_interval_minutes: u32,

    /// Rules captured by every new session.
    #[serde(default)]
    rules: GameRules,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "undefine.db".to_string()
}

fn default_session_idle_hours() -> u32 {
    24
}

fn default_purge_interval_minutes() -> u32 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            session_idle_hours: default_session_idle_hours(),
            purge_interval_minutes: default_purge_interval_minutes(),
            rules: GameRules::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// its rules are invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Resolves the file layer.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a file that should be read cannot be.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Applies `UNDEFINE_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but malformed.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Applies `UNDEFINE_*` overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but malformed.
    #[instrument(skip(self, lookup))]
    pub fn apply_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("UNDEFINE_HOST") {
            debug!(%host, "Host from environment");
            self.host = host;
        }
        if let Some(port) = lookup("UNDEFINE_PORT") {
            self.port = parse_var("UNDEFINE_PORT", &port)?;
        }
        if let Some(path) = lookup("UNDEFINE_DATABASE_PATH") {
            debug!(%path, "Database path from environment");
            self.database_path = path;
        }

        let max_guesses: Option<u8> = lookup("UNDEFINE_MAX_GUESSES")
            .map(|v| parse_var("UNDEFINE_MAX_GUESSES", &v))
            .transpose()?;
        let threshold: Option<f64> = lookup("UNDEFINE_FUZZY_THRESHOLD")
            .map(|v| parse_var("UNDEFINE_FUZZY_THRESHOLD", &v))
            .transpose()?;
        if max_guesses.is_some() || threshold.is_some() {
            self.rules = GameRules::new(
                max_guesses.unwrap_or(*self.rules.max_guesses()),
                threshold.unwrap_or(*self.rules.fuzzy_threshold()),
            )
            .map_err(|e| ConfigError::new(format!("Invalid rules from environment: {}", e)))?;
        }

        Ok(self)
    }

    /// Applies command-line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        database_path: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    /// Replaces the rules.
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Checks the rules and the purge settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules
            .validate()
            .map_err(|e| ConfigError::new(format!("Invalid rules: {}", e)))?;
        if self.purge_interval_minutes == 0 {
            return Err(ConfigError::new("purge_interval_minutes must be positive"));
        }
        Ok(())
    }

    /// Idle time after which a session is purged.
    pub fn session_idle(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.session_idle_hours))
    }

    /// Period of the purge task.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.purge_interval_minutes) * 60)
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        warn!(key, value, "Malformed environment variable");
        ConfigError::new(format!("{} has invalid value '{}': {}", key, value, e))
    })
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
