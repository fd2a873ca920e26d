//! Configuration loading.
//!
//! Tether reads an optional `tether.toml` merged with `TETHER_*`
//! environment variables (nested keys use a double underscore, e.g.
//! `TETHER_LOGGING__LEVEL=debug`). Every setting has a default, so running
//! without any configuration file works.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "compact"
//!
//! [dispatch]
//! expiration_minutes = 15
//! independent_middlewares = true
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tether_dispatch::DispatchConfig;

/// Default configuration file name searched in the working directory and
/// the user's config directory.
pub const CONFIG_FILE: &str = "tether.toml";

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or deserializing the configuration failed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Schema
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Maps to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// Lowercase name as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Logging section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level for all targets.
    pub level: LogLevel,
    /// Line format.
    pub format: LogFormat,
    /// Destination.
    pub output: LogOutput,
    /// Log file path; only used with `output = "file"`.
    pub file_path: Option<PathBuf>,
    /// Per-module level overrides, e.g. `tether_dispatch = "trace"`.
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Loader
// =============================================================================

/// Figment-based configuration loader.
///
/// Merge order (later wins): defaults, user config directory file, working
/// directory file, explicitly set file, environment variables.
pub struct ConfigLoader {
    file: Option<PathBuf>,
    search_cwd: bool,
    search_user_dir: bool,
    with_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            search_cwd: true,
            search_user_dir: true,
            with_env: true,
        }
    }

    /// Loads exactly this file instead of searching the default locations.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Disables the `TETHER_*` environment provider.
    pub fn without_env(mut self) -> Self {
        self.with_env = false;
        self
    }

    /// Disables the default search locations.
    pub fn without_search(mut self) -> Self {
        self.search_cwd = false;
        self.search_user_dir = false;
        self
    }

    /// Loads and merges the configuration.
    pub fn load(self) -> ConfigResult<TetherConfig> {
        let mut figment = Figment::new();

        if self.search_user_dir
            && let Some(config_dir) = dirs::config_dir()
        {
            figment = figment.merge(Toml::file(config_dir.join("tether").join(CONFIG_FILE)));
        }
        if self.search_cwd {
            figment = figment.merge(Toml::file(CONFIG_FILE));
        }
        if let Some(file) = &self.file {
            figment = figment.merge(Toml::file(file));
        }
        if self.with_env {
            figment = figment.merge(Env::prefixed("TETHER_").split("__"));
        }

        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Loads from an inline TOML string, for tests and embedding.
    pub fn from_str(toml: &str) -> ConfigResult<TetherConfig> {
        Ok(Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .map_err(Box::new)?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let config = ConfigLoader::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.dispatch.expiration_minutes, 15);
        assert!(config.dispatch.independent_middlewares);
    }

    #[test]
    fn sections_are_parsed() {
        let config = ConfigLoader::from_str(
            r#"
            [logging]
            level = "debug"
            format = "pretty"
            output = "stderr"

            [logging.filters]
            tether_dispatch = "trace"

            [dispatch]
            expiration_minutes = 5
            independent_middlewares = false
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.output, LogOutput::Stderr);
        assert_eq!(
            config.logging.filters.get("tether_dispatch"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.dispatch.expiration_minutes, 5);
        assert!(!config.dispatch.independent_middlewares);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(ConfigLoader::from_str("[logging]\nlevel = \"loud\"").is_err());
    }
}
