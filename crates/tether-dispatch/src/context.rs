//! The per-event invocation context.
//!
//! One [`InvocationContext`] is created for every dequeued event after type
//! adaptation succeeded, threaded through the middleware chain and finally
//! consumed by the invoker. Middlewares may cancel it; cancellation is
//! monotonic — the first middleware to cancel wins and later calls are
//! ignored.

use std::sync::Arc;

use tracing::debug;

use tether_core::definition::{ArgValue, Invocation};
use tether_core::event::InteractionEvent;
use tether_core::interactions::InteractionDefinition;
use tether_core::kv::KeyValueStore;
use tether_core::reply::Reply;

/// Bundles everything needed to invoke one handler method: the originating
/// event, the resolved definition, the adapted arguments and the owning
/// runtime's scratch store.
pub struct InvocationContext {
    event: Arc<InteractionEvent>,
    definition: Arc<InteractionDefinition>,
    args: Vec<ArgValue>,
    kv: KeyValueStore,
    cancellation: Option<Reply>,
}

impl InvocationContext {
    pub(crate) fn new(
        event: Arc<InteractionEvent>,
        definition: Arc<InteractionDefinition>,
        args: Vec<ArgValue>,
        kv: KeyValueStore,
    ) -> Self {
        Self {
            event,
            definition,
            args,
            kv,
            cancellation: None,
        }
    }

    /// The interaction event being processed.
    pub fn event(&self) -> &Arc<InteractionEvent> {
        &self.event
    }

    /// The definition resolved for this event.
    pub fn definition(&self) -> &Arc<InteractionDefinition> {
        &self.definition
    }

    /// The adapted arguments, in declaration order.
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// The owning runtime's key/value store.
    pub fn kv(&self) -> &KeyValueStore {
        &self.kv
    }

    /// Cancels this invocation: the handler method will not run and
    /// `reply` is sent instead.
    ///
    /// Cancellation is monotonic. Once a middleware cancelled the context,
    /// later cancellations are ignored and the first reply wins.
    pub fn cancel(&mut self, reply: Reply) {
        if self.cancellation.is_some() {
            debug!("Invocation already cancelled, ignoring further cancellation");
            return;
        }
        self.cancellation = Some(reply);
    }

    /// Returns `true` once a middleware cancelled this invocation.
    pub fn cancelled(&self) -> bool {
        self.cancellation.is_some()
    }

    pub(crate) fn take_cancellation(&mut self) -> Option<Reply> {
        self.cancellation.take()
    }

    /// Consumes the context into the value handed to the handler closure.
    pub(crate) fn into_invocation(self) -> Invocation {
        Invocation {
            event: self.event,
            args: self.args,
            kv: self.kv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tether_core::event::{InteractionKind, UserRef};
    use tether_core::interactions::ButtonDefinition;

    use crate::testing::NullHook;

    #[derive(Default)]
    struct Ctrl;

    fn context() -> InvocationContext {
        let definition = Arc::new(
            ButtonDefinition::builder::<Ctrl>("go")
                .label("Go")
                .handler(|_c, _i| async move {}),
        );
        let event = Arc::new(InteractionEvent::new(
            InteractionKind::Component {
                custom_id: "jdac.static.Ctrl.go".into(),
                values: Vec::new(),
            },
            UserRef::new(1, "ada"),
            Arc::new(NullHook),
        ));
        InvocationContext::new(event, definition, Vec::new(), KeyValueStore::new())
    }

    #[test]
    fn cancellation_is_monotonic() {
        let mut ctx = context();
        assert!(!ctx.cancelled());
        ctx.cancel(Reply::new("first"));
        ctx.cancel(Reply::new("second"));
        assert!(ctx.cancelled());
        assert_eq!(ctx.take_cancellation().map(|r| r.content).as_deref(), Some("first"));
    }
}
