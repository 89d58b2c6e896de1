//! Service configuration.
//!
//! Values resolve in order: built-in defaults, then a TOML file (with
//! `${VAR}` interpolation), then `MEMBERSHIP_*` environment variables, then
//! programmatic overrides. The result is validated before it is returned.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Files searched, in order, when no explicit path is given.
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["membership.toml", "config/membership.toml"];

/// Environment variable and the dotted config key it sets.
pub const ENV_KEYS: [(&str, &str); 8] = [
    ("MEMBERSHIP_DATABASE_URL", "database.url"),
    ("MEMBERSHIP_DATABASE_MAX_CONNECTIONS", "database.max_connections"),
    ("MEMBERSHIP_DATABASE_TIMEOUT_SECS", "database.timeout_secs"),
    ("MEMBERSHIP_SERVER_BIND_ADDRESS", "server.bind_address"),
    ("MEMBERSHIP_SERVER_PORT", "server.port"),
    ("MEMBERSHIP_SERVER_GRACEFUL_SHUTDOWN_SECS", "server.graceful_shutdown_secs"),
    ("MEMBERSHIP_LOGGING_LEVEL", "logging.level"),
    ("MEMBERSHIP_LOGGING_FORMAT", "logging.format"),
];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://membership.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080, graceful_shutdown_secs: 15 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Self::Compact, Self::Pretty, Self::Json]
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("expected compact|pretty|json, got `{value}`"))
    }
}

/// Values set by the caller; they win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Must exist when set. Otherwise the candidates are searched and a
    /// missing file means defaults.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("cannot parse `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` without a closing `}}` in the config file")]
    UnterminatedInterpolation,
    #[error("{key}=`{value}` is invalid: {reason}")]
    InvalidEnvOverride { key: String, value: String, reason: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match config_file(options.config_path)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        for (env_key, config_key) in ENV_KEYS {
            if let Some(raw) = env::var(env_key).ok().filter(|raw| !raw.trim().is_empty()) {
                config.set(config_key, &raw).map_err(|reason| ConfigError::InvalidEnvOverride {
                    key: env_key.to_string(),
                    value: raw.clone(),
                    reason,
                })?;
            }
        }

        config.apply(options.overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// Reports every invalid value at once, each prefixed with its key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            problems.push("database.url must be a sqlite URL".to_string());
        }
        if self.database.max_connections == 0 {
            problems.push("database.max_connections must be at least 1".to_string());
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.database.timeout_secs) {
            problems.push(format!("database.timeout_secs must be in 1..={MAX_TIMEOUT_SECS}"));
        }
        if self.server.bind_address.trim().is_empty() {
            problems.push("server.bind_address must not be empty".to_string());
        }
        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }
        if self.server.graceful_shutdown_secs == 0 {
            problems.push("server.graceful_shutdown_secs must be at least 1".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.trim().to_ascii_lowercase().as_str()) {
            problems.push(format!("logging.level must be one of {}", LOG_LEVELS.join("|")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&interpolate(&raw)?)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn set(&mut self, config_key: &str, raw: &str) -> Result<(), String> {
        let raw = raw.trim();
        match config_key {
            "database.url" => self.database.url = raw.to_string(),
            "database.max_connections" => self.database.max_connections = parse(raw)?,
            "database.timeout_secs" => self.database.timeout_secs = parse(raw)?,
            "server.bind_address" => self.server.bind_address = raw.to_string(),
            "server.port" => self.server.port = parse(raw)?,
            "server.graceful_shutdown_secs" => self.server.graceful_shutdown_secs = parse(raw)?,
            "logging.level" => self.logging.level = raw.to_string(),
            "logging.format" => self.logging.format = raw.parse()?,
            other => return Err(format!("unknown config key `{other}`")),
        }
        Ok(())
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self.server.port = overrides.port.unwrap_or(self.server.port);
        self.logging.format = overrides.log_format.unwrap_or(self.logging.format);
    }
}

/// The file `load` would read: the explicit path if given, else the first
/// existing candidate.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|path| path.is_file()),
    }
}

fn config_file(explicit_path: Option<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit_path {
        Some(path) if !path.exists() => Err(ConfigError::MissingConfigFile(path)),
        Some(path) => Ok(Some(path)),
        None => Ok(resolve_config_path(None)),
    }
}

fn parse<T: FromStr>(raw: &str) -> Result<T, String>
where
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|error| error.to_string())
}

/// Replaces each `${VAR}` with the variable's value.
fn interpolate(raw: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &tail[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}
