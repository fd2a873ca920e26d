//! User-facing error replies.
//!
//! Every failure the dispatcher surfaces to the end user travels the same
//! reply channel as a successful response. The [`ErrorMessageFactory`]
//! decides what those replies look like; applications swap in their own
//! implementation for custom wording or localization.

use std::time::Duration;

use tether_core::interactions::InteractionDefinition;
use tether_core::reply::Reply;

use crate::adapt::AdaptError;
use crate::validate::ConstraintViolation;

/// Produces the user-facing reply for each failure class.
///
/// All built-in messages are ephemeral so failures stay between the
/// framework and the invoking user.
pub trait ErrorMessageFactory: Send + Sync {
    /// A component or modal whose runtime is gone (expired, restarted).
    fn unknown_interaction(&self) -> Reply;

    /// The invoking user lacks one of the definition's permissions.
    fn insufficient_permissions(&self, definition: &InteractionDefinition) -> Reply;

    /// The per-user cooldown has not elapsed yet.
    fn cooldown(&self, remaining: Duration) -> Reply;

    /// A declared constraint rejected an adapted value.
    fn constraint_failed(&self, violation: &ConstraintViolation) -> Reply;

    /// A raw value could not be adapted to its declared kind.
    fn type_adapting_failed(&self, error: &AdaptError) -> Reply;

    /// The handler method returned an error.
    fn execution_failed(&self) -> Reply;
}

/// Plain-text default implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorMessages;

impl ErrorMessageFactory for DefaultErrorMessages {
    fn unknown_interaction(&self) -> Reply {
        Reply::new("This interaction is no longer available.")
            .ephemeral(true)
            .edit(false)
    }

    fn insufficient_permissions(&self, _definition: &InteractionDefinition) -> Reply {
        Reply::new("You are missing the permissions required for this interaction.")
            .ephemeral(true)
            .edit(false)
    }

    fn cooldown(&self, remaining: Duration) -> Reply {
        let seconds = remaining.as_secs().max(1);
        Reply::new(format!(
            "You are still on cooldown. Try again in {seconds} second(s)."
        ))
        .ephemeral(true)
        .edit(false)
    }

    fn constraint_failed(&self, violation: &ConstraintViolation) -> Reply {
        Reply::new(format!("Invalid input: {}", violation.message))
            .ephemeral(true)
            .edit(false)
    }

    fn type_adapting_failed(&self, error: &AdaptError) -> Reply {
        Reply::new(format!("Invalid input: {error}"))
            .ephemeral(true)
            .edit(false)
    }

    fn execution_failed(&self) -> Reply {
        Reply::new("Something went wrong while executing this interaction. Please try again.")
            .ephemeral(true)
            .edit(false)
    }
}
