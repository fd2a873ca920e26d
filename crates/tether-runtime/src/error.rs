//! Application-level error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced while bootstrapping or running a [`TetherApp`](crate::app::TetherApp).
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A platform adapter failed before delivering any event.
    #[error("platform '{platform}' failed: {error}")]
    Platform {
        /// Name of the failing platform adapter.
        platform: String,
        /// The underlying gateway error.
        error: tether_core::error::GatewayError,
    },
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
