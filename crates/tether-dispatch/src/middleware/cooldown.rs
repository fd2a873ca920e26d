//! The cooldown check middleware.
//!
//! Slash commands may declare a minimum delay between invocations per
//! user. The bookkeeping is delegated to a [`CooldownStore`] keyed by
//! user and definition; the in-memory default suffices for a single
//! process, while applications with several shards can plug in a shared
//! store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use tether_core::definition::DefinitionId;
use tether_core::interactions::InteractionDefinition;

use super::Middleware;
use crate::context::InvocationContext;
use crate::messages::ErrorMessageFactory;

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    /// No active cooldown; a new one has been started.
    Ready,
    /// A cooldown is active for the given remaining duration.
    Active(Duration),
}

/// Tracks the last invocation time per user and definition.
pub trait CooldownStore: Send + Sync {
    /// Checks (and on success refreshes) the cooldown entry.
    fn check(&self, user: u64, definition: &DefinitionId, delay: Duration) -> CooldownOutcome;
}

/// Process-local cooldown store.
#[derive(Default)]
pub struct InMemoryCooldowns {
    entries: Mutex<HashMap<(u64, DefinitionId), Instant>>,
}

impl InMemoryCooldowns {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CooldownStore for InMemoryCooldowns {
    fn check(&self, user: u64, definition: &DefinitionId, delay: Duration) -> CooldownOutcome {
        let mut entries = self.entries.lock();
        let key = (user, definition.clone());
        if let Some(started) = entries.get(&key) {
            let elapsed = started.elapsed();
            if elapsed < delay {
                return CooldownOutcome::Active(delay - elapsed);
            }
        }
        entries.insert(key, Instant::now());
        CooldownOutcome::Ready
    }
}

/// Built-in middleware enforcing slash command cooldowns.
pub struct CooldownMiddleware {
    store: Arc<dyn CooldownStore>,
    messages: Arc<dyn ErrorMessageFactory>,
}

impl CooldownMiddleware {
    pub fn new(store: Arc<dyn CooldownStore>, messages: Arc<dyn ErrorMessageFactory>) -> Self {
        Self { store, messages }
    }
}

#[async_trait]
impl Middleware for CooldownMiddleware {
    async fn call(&self, ctx: &mut InvocationContext) {
        let InteractionDefinition::SlashCommand(command) = &**ctx.definition() else {
            return;
        };
        let Some(delay) = command.cooldown.filter(|delay| !delay.is_zero()) else {
            return;
        };

        let user = ctx.event().user().id;
        match self.store.check(user, &command.base.id, delay) {
            CooldownOutcome::Ready => {}
            CooldownOutcome::Active(remaining) => {
                debug!(remaining_ms = remaining.as_millis() as u64, "Command on cooldown");
                let reply = self.messages.cooldown(remaining);
                ctx.cancel(reply);
            }
        }
    }

    fn name(&self) -> &str {
        "cooldown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_tracks_per_user_and_definition() {
        let store = InMemoryCooldowns::new();
        let id = DefinitionId::new("GreetCmd", "greet");
        let delay = Duration::from_secs(60);

        assert_eq!(store.check(1, &id, delay), CooldownOutcome::Ready);
        assert!(matches!(
            store.check(1, &id, delay),
            CooldownOutcome::Active(_)
        ));
        // different user and different definition are unaffected
        assert_eq!(store.check(2, &id, delay), CooldownOutcome::Ready);
        let other = DefinitionId::new("GreetCmd", "other");
        assert_eq!(store.check(1, &other, delay), CooldownOutcome::Ready);
    }

    #[test]
    fn elapsed_cooldown_is_ready_again() {
        let store = InMemoryCooldowns::new();
        let id = DefinitionId::new("GreetCmd", "greet");
        assert_eq!(
            store.check(1, &id, Duration::ZERO),
            CooldownOutcome::Ready
        );
        assert_eq!(
            store.check(1, &id, Duration::ZERO),
            CooldownOutcome::Ready
        );
    }
}
