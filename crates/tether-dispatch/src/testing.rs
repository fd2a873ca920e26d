//! Shared test doubles for the dispatch engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tether_core::error::GatewayResult;
use tether_core::gateway::{MessageRef, ReplyHook};
use tether_core::registry::InteractionRegistry;
use tether_core::reply::{Choice, OutboundPayload};

use crate::adapt::TypeAdapters;
use crate::config::DispatchConfig;
use crate::handling::Engine;
use crate::messages::DefaultErrorMessages;
use crate::middleware::{AllowAllPermissions, InMemoryCooldowns, Middlewares};

/// Hook that accepts everything and records nothing.
pub(crate) struct NullHook;

#[async_trait]
impl ReplyHook for NullHook {
    async fn defer(&self, _ephemeral: bool) -> GatewayResult<()> {
        Ok(())
    }

    async fn send(&self, _payload: OutboundPayload) -> GatewayResult<MessageRef> {
        Ok(MessageRef { id: 0, channel_id: 0 })
    }

    async fn edit(
        &self,
        message: MessageRef,
        _payload: OutboundPayload,
    ) -> GatewayResult<MessageRef> {
        Ok(message)
    }

    async fn autocomplete(&self, _choices: Vec<Choice>) -> GatewayResult<()> {
        Ok(())
    }
}

/// Hook recording every payload that went over the wire.
#[derive(Default)]
pub(crate) struct RecordingHook {
    sent: Mutex<Vec<OutboundPayload>>,
    edited: Mutex<Vec<(MessageRef, OutboundPayload)>>,
    choices: Mutex<Vec<Vec<Choice>>>,
    next_id: AtomicU64,
}

impl RecordingHook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub(crate) fn edit_count(&self) -> usize {
        self.edited.lock().len()
    }

    pub(crate) fn last_sent(&self) -> Option<OutboundPayload> {
        self.sent.lock().last().cloned()
    }

    pub(crate) fn last_edit(&self) -> Option<(MessageRef, OutboundPayload)> {
        self.edited.lock().last().cloned()
    }

    pub(crate) fn last_choices(&self) -> Option<Vec<Choice>> {
        self.choices.lock().last().cloned()
    }
}

#[async_trait]
impl ReplyHook for RecordingHook {
    async fn defer(&self, _ephemeral: bool) -> GatewayResult<()> {
        Ok(())
    }

    async fn send(&self, payload: OutboundPayload) -> GatewayResult<MessageRef> {
        self.sent.lock().push(payload);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageRef { id, channel_id: 1 })
    }

    async fn edit(
        &self,
        message: MessageRef,
        payload: OutboundPayload,
    ) -> GatewayResult<MessageRef> {
        self.edited.lock().push((message, payload));
        Ok(message)
    }

    async fn autocomplete(&self, choices: Vec<Choice>) -> GatewayResult<()> {
        self.choices.lock().push(choices);
        Ok(())
    }
}

/// Builds an engine with default services around the given registry.
pub(crate) fn engine_for(registry: InteractionRegistry) -> Arc<Engine> {
    let messages = Arc::new(DefaultErrorMessages);
    Arc::new(Engine {
        registry: Arc::new(registry),
        adapters: TypeAdapters::with_defaults(),
        middlewares: Middlewares::with_defaults(
            Arc::new(AllowAllPermissions),
            Arc::new(InMemoryCooldowns::new()),
            messages.clone(),
        ),
        messages,
        config: DispatchConfig::default(),
    })
}

/// Polls `check` until it holds, panicking after roughly one second.
pub(crate) async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
