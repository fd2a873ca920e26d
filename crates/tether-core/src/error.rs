//! Unified error types for the Tether core crate.
//!
//! Dispatch-level errors (adaptation, constraint violations) are defined in
//! `tether-dispatch`; this module only covers the foundation types.

use thiserror::Error;

use crate::interactions::DefinitionKind;

/// Boxed error type returned by user-written handler bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Custom Id Errors
// =============================================================================

/// Errors produced while parsing or constructing a [`CustomId`](crate::custom_id::CustomId).
#[derive(Debug, Clone, Error)]
pub enum CustomIdError {
    /// The string carries the framework prefix but does not match the
    /// expected `namespace.scope.definitionId` shape.
    #[error("malformed custom id: '{0}'")]
    Malformed(String),

    /// The scope segment is neither the independent marker nor a valid
    /// runtime token.
    #[error("invalid runtime token: '{0}'")]
    InvalidRuntimeToken(String),

    /// The definition id segment is not of the form `Controller.method`.
    #[error("invalid definition id: '{0}'")]
    InvalidDefinitionId(String),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors produced by [`InteractionRegistry`](crate::registry::InteractionRegistry) lookups.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No definition is registered under the given id.
    #[error("no interaction definition registered for id '{0}'")]
    NotFound(String),

    /// A definition exists but is of a different kind than the caller
    /// expected, e.g. a modal id used where a component is expected.
    #[error("definition '{id}' is a {actual}, expected a {expected}")]
    KindMismatch {
        /// The looked-up definition id.
        id: String,
        /// The kind the caller asked for.
        expected: DefinitionKind,
        /// The kind actually registered under the id.
        actual: DefinitionKind,
    },

    /// No slash or context command is registered under the given name.
    #[error("no command registered with name '{0}'")]
    CommandNotFound(String),
}

/// Result type for registry lookups.
pub type RegistryResult<T> = Result<T, RegistryError>;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors produced by the platform gateway while delivering replies.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The underlying network call failed.
    #[error("gateway request failed: {0}")]
    Network(String),

    /// The platform no longer knows the interaction, e.g. the
    /// acknowledgement window elapsed.
    #[error("interaction is no longer known to the platform")]
    UnknownInteraction,

    /// The payload was rejected by the platform.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
