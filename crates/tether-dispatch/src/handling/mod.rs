//! Kind-specific event handling.
//!
//! Every dequeued event runs the same three-step skeleton: *prepare* (build
//! the [`InvocationContext`], including type adaptation and constraint
//! validation), *middlewares* (the priority-ordered chain, which may
//! cancel), and *invoke* (call the bound handler on the runtime-cached
//! controller instance and deliver its reply). The per-kind modules
//! implement the prepare step; the shared tail lives here on [`Engine`].

pub(crate) mod autocomplete;
pub(crate) mod command;
pub(crate) mod component;
pub(crate) mod modal;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info};

use tether_core::event::{InteractionEvent, InteractionKind};
use tether_core::interactions::InteractionDefinition;
use tether_core::registry::InteractionRegistry;
use tether_core::reply::Reply;

use crate::adapt::TypeAdapters;
use crate::config::DispatchConfig;
use crate::context::InvocationContext;
use crate::messages::ErrorMessageFactory;
use crate::middleware::Middlewares;
use crate::reply::ReplyPipeline;
use crate::runtime::Runtime;

/// The shared services every handler needs: the definition registry, the
/// adapter registry, the middleware chain, the error-message factory and
/// the dispatch configuration. One engine is built per supervisor and
/// shared by all runtimes.
pub(crate) struct Engine {
    pub(crate) registry: Arc<InteractionRegistry>,
    pub(crate) adapters: TypeAdapters,
    pub(crate) middlewares: Middlewares,
    pub(crate) messages: Arc<dyn ErrorMessageFactory>,
    pub(crate) config: DispatchConfig,
}

impl Engine {
    /// Dispatches one dequeued event to its kind-specific handler.
    ///
    /// The match is closed and exhaustive; the supervisor already
    /// classified the event, so every representable kind has a handler.
    pub(crate) async fn handle(&self, event: InteractionEvent, runtime: &Runtime) {
        debug!(event = event.kind().name(), "Handling event");
        let event = Arc::new(event);
        match event.kind() {
            InteractionKind::SlashCommand { .. } => command::slash(self, runtime, event).await,
            InteractionKind::ContextCommand { .. } => command::context(self, runtime, event).await,
            InteractionKind::Autocomplete { .. } => {
                autocomplete::handle(self, runtime, event).await
            }
            InteractionKind::Component { .. } => component::handle(self, runtime, event).await,
            InteractionKind::Modal { .. } => modal::handle(self, runtime, event).await,
        }
    }

    /// Runs the middleware chain and, unless cancelled, invokes the bound
    /// handler method.
    pub(crate) async fn finish(
        &self,
        runtime: &Runtime,
        mut ctx: InvocationContext,
        run_middlewares: bool,
    ) {
        if run_middlewares {
            self.middlewares.run(&mut ctx).await;
        }

        if let Some(reply) = ctx.take_cancellation() {
            debug!("Invocation cancelled by middleware");
            let definition = Arc::clone(ctx.definition());
            let event = Arc::clone(ctx.event());
            self.send_cancellation(runtime, &event, Some(&definition), reply)
                .await;
            return;
        }

        self.invoke(runtime, ctx).await;
    }

    /// Invokes the handler and manages its reply lifecycle.
    ///
    /// Handler errors are terminal for this one event: they are logged
    /// with full context, converted into the generic execution-failed
    /// reply, and never retried. The runtime survives and keeps processing
    /// subsequent events.
    async fn invoke(&self, runtime: &Runtime, ctx: InvocationContext) {
        let definition = Arc::clone(ctx.definition());
        let event = Arc::clone(ctx.event());

        let Some(invoke) = definition.invoke() else {
            error!(id = %definition.id(), "Definition has no invocation closure");
            return;
        };
        let invoke = Arc::clone(invoke);
        let instance = runtime.instance(definition.controller());

        info!(
            interaction = %definition.display_name(),
            user = %event.user().name,
            "Executing interaction"
        );

        // catch panics at the invocation boundary so a crashing handler
        // terminates only this one event, never the runtime's worker
        let outcome = AssertUnwindSafe(invoke(instance, ctx.into_invocation()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err("interaction handler panicked".into()));

        match outcome {
            Ok(Some(reply)) => {
                let pipeline = ReplyPipeline::new(self, runtime, &event, Some(&definition));
                if let Err(delivery_error) = pipeline.deliver(reply).await {
                    error!(
                        interaction = %definition.display_name(),
                        error = %delivery_error,
                        "Failed to deliver reply"
                    );
                    self.send_cancellation(
                        runtime,
                        &event,
                        Some(&definition),
                        self.messages.execution_failed(),
                    )
                    .await;
                }
            }
            Ok(None) => {}
            Err(handler_error) => {
                error!(
                    interaction = %definition.display_name(),
                    user = %event.user().name,
                    kind = event.kind().name(),
                    error = %handler_error,
                    "Interaction execution failed"
                );
                self.send_cancellation(
                    runtime,
                    &event,
                    Some(&definition),
                    self.messages.execution_failed(),
                )
                .await;
            }
        }
    }

    /// Delivers a cancellation or error reply through the regular reply
    /// channel. Delivery failures are logged, never propagated.
    pub(crate) async fn send_cancellation(
        &self,
        runtime: &Runtime,
        event: &Arc<InteractionEvent>,
        definition: Option<&Arc<InteractionDefinition>>,
        reply: Reply,
    ) {
        let pipeline = ReplyPipeline::new(self, runtime, event, definition);
        if let Err(delivery_error) = pipeline.deliver(reply).await {
            error!(error = %delivery_error, "Failed to deliver cancellation reply");
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}
