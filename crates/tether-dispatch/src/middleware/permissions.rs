//! The permission check middleware.
//!
//! Permission *policy* lives outside the dispatch engine: the middleware
//! only asks the application-supplied [`PermissionsProvider`] whether the
//! invoking user satisfies the definition's declared permission strings,
//! and cancels the invocation when the answer is no.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tether_core::event::{InteractionEvent, UserRef};

use super::Middleware;
use crate::context::InvocationContext;
use crate::messages::ErrorMessageFactory;

/// Decides whether a user satisfies a set of permission strings.
///
/// What a permission string means is entirely up to the application —
/// platform permissions, role names, database lookups.
#[async_trait]
pub trait PermissionsProvider: Send + Sync {
    async fn has_permissions(
        &self,
        user: &UserRef,
        permissions: &[String],
        event: &InteractionEvent,
    ) -> bool;
}

/// Default provider that grants everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionsProvider for AllowAllPermissions {
    async fn has_permissions(
        &self,
        _user: &UserRef,
        _permissions: &[String],
        _event: &InteractionEvent,
    ) -> bool {
        true
    }
}

/// Built-in middleware enforcing a definition's permission strings.
pub struct PermissionsMiddleware {
    provider: Arc<dyn PermissionsProvider>,
    messages: Arc<dyn ErrorMessageFactory>,
}

impl PermissionsMiddleware {
    pub fn new(provider: Arc<dyn PermissionsProvider>, messages: Arc<dyn ErrorMessageFactory>) -> Self {
        Self { provider, messages }
    }
}

#[async_trait]
impl Middleware for PermissionsMiddleware {
    async fn call(&self, ctx: &mut InvocationContext) {
        let permissions = ctx.definition().permissions();
        if permissions.is_empty() {
            return;
        }

        let event = Arc::clone(ctx.event());
        let allowed = self
            .provider
            .has_permissions(event.user(), permissions, &event)
            .await;

        if !allowed {
            debug!(user = %event.user().name, "Insufficient permissions");
            let reply = self.messages.insufficient_permissions(ctx.definition());
            ctx.cancel(reply);
        }
    }

    fn name(&self) -> &str {
        "permissions"
    }
}
