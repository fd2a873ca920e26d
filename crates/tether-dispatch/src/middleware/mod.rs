//! The middleware chain.
//!
//! Middlewares run between argument preparation and handler invocation,
//! ordered by a small fixed set of priority tiers. Any middleware may call
//! [`InvocationContext::cancel`], which stops the chain immediately: later
//! middlewares and the handler are skipped and the supplied reply is sent
//! instead.
//!
//! Built-in middlewares cover permission and cooldown checks; applications
//! splice their own middlewares into the ordering by registering them with
//! a [`Priority`]. Middlewares sharing a tier run in no guaranteed order.

mod cooldown;
mod permissions;

pub use cooldown::{CooldownMiddleware, CooldownOutcome, CooldownStore, InMemoryCooldowns};
pub use permissions::{AllowAllPermissions, PermissionsMiddleware, PermissionsProvider};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::context::InvocationContext;
use crate::messages::ErrorMessageFactory;

/// A pluggable, cancellation-capable pre-invocation check.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Inspects the invocation; may cancel it with a reply.
    async fn call(&self, ctx: &mut InvocationContext);

    /// Name used in trace logs.
    fn name(&self) -> &str {
        "middleware"
    }
}

/// Execution tier of a middleware. Lower tiers run first; the permission
/// tier always runs before any business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Reserved for permission checks.
    Permissions,
    /// Runs before the default tier.
    High,
    /// The default tier; built-in cooldown checks live here.
    Normal,
    /// Runs last.
    Low,
}

/// The ordered set of registered middlewares.
pub struct Middlewares {
    tiers: BTreeMap<Priority, Vec<Arc<dyn Middleware>>>,
}

impl Middlewares {
    /// An empty chain without even the built-in checks.
    pub fn empty() -> Self {
        Self {
            tiers: BTreeMap::new(),
        }
    }

    /// A chain with the built-in permission and cooldown middlewares.
    pub fn with_defaults(
        permissions: Arc<dyn PermissionsProvider>,
        cooldowns: Arc<dyn CooldownStore>,
        messages: Arc<dyn ErrorMessageFactory>,
    ) -> Self {
        let mut chain = Self::empty();
        chain.register(
            Priority::Permissions,
            Arc::new(PermissionsMiddleware::new(permissions, Arc::clone(&messages))),
        );
        chain.register(
            Priority::Normal,
            Arc::new(CooldownMiddleware::new(cooldowns, messages)),
        );
        chain
    }

    /// Splices a middleware into the given tier.
    pub fn register(&mut self, priority: Priority, middleware: Arc<dyn Middleware>) {
        self.tiers.entry(priority).or_default().push(middleware);
    }

    /// Total number of registered middlewares.
    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    /// Returns `true` if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the chain tier by tier, stopping at the first cancellation.
    pub async fn run(&self, ctx: &mut InvocationContext) {
        for middlewares in self.tiers.values() {
            for middleware in middlewares {
                debug!(middleware = middleware.name(), "Executing middleware");
                middleware.call(ctx).await;
                if ctx.cancelled() {
                    debug!(
                        middleware = middleware.name(),
                        "Middleware cancelled the invocation, stopping the chain"
                    );
                    return;
                }
            }
        }
    }
}

impl std::fmt::Debug for Middlewares {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middlewares")
            .field("count", &self.len())
            .finish()
    }
}
