//! Logging setup.
//!
//! Thin builder around `tracing-subscriber`, driven by the
//! [`LoggingConfig`] section or configured manually:
//!
//! ```rust,ignore
//! use tether_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .level(tracing::Level::DEBUG)
//!     .directive("tether_dispatch=trace")
//!     .init();
//! ```
//!
//! `RUST_LOG` always wins over configured levels, so a deployed bot can be
//! put into debug logging without touching its configuration file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Initializes logging from the configuration section.
///
/// Safe to call more than once; only the first initialization wins.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Builder for the global tracing subscriber.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    level: Option<tracing::Level>,
    directives: Vec<String>,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preconfigured from a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new()
            .level(config.level.to_tracing_level())
            .format(config.format)
            .output(config.output);
        builder.file_path.clone_from(&config.file_path);
        for (module, level) in &config.filters {
            builder = builder.directive(&format!("{}={}", module, level.as_str()));
        }
        builder
    }

    /// Sets the base log level.
    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a filter directive, e.g. `tether_dispatch=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Sets the line format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets the log file path used with [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base = self
            .level
            .unwrap_or(tracing::Level::INFO)
            .to_string()
            .to_lowercase();
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in &self.directives {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
        filter
    }

    /// Installs the subscriber, panicking on double initialization.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();

        macro_rules! init_with_writer {
            ($writer:expr) => {{
                let format = self.format;
                #[cfg(feature = "json-log")]
                if matches!(format, LogFormat::Json) {
                    let layer = fmt::layer().json().with_writer($writer);
                    return tracing_subscriber::registry()
                        .with(layer)
                        .with(filter)
                        .try_init();
                }
                match format {
                    LogFormat::Full => {
                        let layer = fmt::layer().with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer = fmt::layer().pretty().with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    // json without the json-log feature degrades to compact
                    _ => {
                        let layer = fmt::layer().compact().with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            }};
        }

        match self.output {
            LogOutput::Stdout => init_with_writer!(std::io::stdout),
            LogOutput::Stderr => init_with_writer!(std::io::stderr),
            LogOutput::File => {
                let path = self.file_path.clone().unwrap_or_else(|| "tether.log".into());
                let appender = tracing_appender::rolling::never(
                    path.parent().unwrap_or_else(|| Path::new(".")),
                    path.file_name().unwrap_or_else(|| OsStr::new("tether.log")),
                );
                init_with_writer!(appender)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::collections::HashMap;

    #[test]
    fn builder_from_config_carries_filters() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            file_path: None,
            filters: HashMap::from([("tether_dispatch".to_string(), LogLevel::Trace)]),
        };
        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert_eq!(builder.format, LogFormat::Pretty);
        assert_eq!(builder.directives, vec!["tether_dispatch=trace"]);
    }
}
