//! The platform gateway abstraction.
//!
//! Tether treats the underlying chat-platform client as a black box: an
//! event source pushing [`InteractionEvent`]s into an [`EventSink`], and a
//! REST sink reached through the per-interaction [`ReplyHook`]. Adapters for
//! concrete client libraries implement [`Platform`] and [`ReplyHook`];
//! nothing in the dispatch engine knows about wire formats.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::event::InteractionEvent;
use crate::reply::{Choice, OutboundPayload};

/// Reference to a message previously sent through a [`ReplyHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub id: u64,
    pub channel_id: u64,
}

/// The reply channel of a single interaction.
///
/// Every call is a complete network round-trip from the caller's
/// perspective; the dispatch engine awaits them on the owning runtime's
/// worker, trading latency for strict per-runtime ordering.
#[async_trait]
pub trait ReplyHook: Send + Sync {
    /// Acknowledges the interaction without sending content yet.
    async fn defer(&self, ephemeral: bool) -> GatewayResult<()>;

    /// Sends a new message in reply to the interaction.
    async fn send(&self, payload: OutboundPayload) -> GatewayResult<MessageRef>;

    /// Edits a previously sent message in place.
    async fn edit(&self, message: MessageRef, payload: OutboundPayload)
    -> GatewayResult<MessageRef>;

    /// Replies to an autocomplete interaction with suggestion choices.
    async fn autocomplete(&self, choices: Vec<Choice>) -> GatewayResult<()>;
}

/// A platform client adapter.
///
/// `start` runs the client's event loop and pushes every interaction it
/// receives into the sink; it returns when the connection closes.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Name of the platform adapter, used in logs.
    fn name(&self) -> &str;

    /// Runs the client, delivering events until shutdown.
    async fn start(&self, sink: EventSink) -> GatewayResult<()>;
}

/// Clonable handle through which platform adapters deliver events to the
/// dispatcher. Pushing never blocks; classification and handler execution
/// happen on the receiving side.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(InteractionEvent) + Send + Sync>,
}

impl EventSink {
    /// Creates a sink from a delivery function.
    pub fn new(deliver: impl Fn(InteractionEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Delivers one event to the dispatcher.
    pub fn push(&self, event: InteractionEvent) {
        (self.deliver)(event);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
