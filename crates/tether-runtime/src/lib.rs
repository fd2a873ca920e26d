//! # Tether Runtime
//!
//! Orchestration layer for the Tether interaction framework: configuration
//! loading ([`config`]), logging setup ([`logging`]) and the application
//! bootstrap ([`app::TetherApp`]) that wires platform adapters to a started
//! dispatch supervisor and runs until shutdown.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{TetherApp, TetherAppBuilder};
pub use config::{ConfigError, ConfigLoader, LogFormat, LogLevel, LogOutput, LoggingConfig,
    TetherConfig};
pub use error::{AppError, AppResult};
pub use logging::LoggingBuilder;
