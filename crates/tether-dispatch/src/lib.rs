//! # Tether Dispatch
//!
//! The dispatch engine of the Tether interaction framework: everything
//! between "the platform delivered an interaction event" and "the bound
//! handler method ran and its reply went out".
//!
//! ## Architecture
//!
//! Events flow through four stages:
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────────────────────┐
//! │ Platform │──▶│ Supervisor │──▶│ Runtime (one per            │
//! │ adapter  │   │ (classify, │   │ conversation): FIFO queue + │
//! └──────────┘   │  route)    │   │ single worker task          │
//!                └────────────┘   └──────────────┬──────────────┘
//!                                                ▼
//!                              pipeline (adapt → validate) →
//!                              middlewares → invoke → reply
//! ```
//!
//! - The [`Supervisor`] is the single event entry point. It classifies
//!   each event, creates a fresh [`Runtime`] for top-level interactions,
//!   and traces components and modals back to their owning runtime via
//!   the custom id.
//! - Each [`Runtime`] serializes its conversation's events onto one worker
//!   task; distinct runtimes run in parallel.
//! - The argument pipeline ([`TypeAdapters`], constraint validation) turns
//!   raw platform values into typed arguments.
//! - The [`Middleware`] chain runs priority-ordered checks that may cancel
//!   the invocation with a reply.
//! - The invoker calls the bound handler on the runtime-cached controller
//!   instance and delivers its reply, stamping attached components with
//!   runtime-scoped custom ids.

pub mod adapt;
pub mod config;
pub mod context;
mod handling;
pub mod messages;
pub mod middleware;
mod reply;
pub mod runtime;
pub mod supervisor;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use adapt::{AdaptError, TypeAdapter, TypeAdapters};
pub use config::{DispatchConfig, ExpirationStrategy};
pub use context::InvocationContext;
pub use messages::{DefaultErrorMessages, ErrorMessageFactory};
pub use middleware::{
    AllowAllPermissions, CooldownMiddleware, CooldownOutcome, CooldownStore, InMemoryCooldowns,
    Middleware, Middlewares, PermissionsMiddleware, PermissionsProvider, Priority,
};
pub use reply::DeliverError;
pub use runtime::Runtime;
pub use supervisor::{Supervisor, SupervisorBuilder};
pub use validate::ConstraintViolation;
