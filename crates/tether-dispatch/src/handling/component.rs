//! Component (button and select menu) handling.

use std::sync::Arc;

use tracing::{error, warn};

use tether_core::custom_id::CustomId;
use tether_core::event::{InteractionEvent, InteractionKind};

use super::Engine;
use crate::adapt::raw_to_arg;
use crate::context::InvocationContext;
use crate::runtime::Runtime;

pub(crate) async fn handle(engine: &Engine, runtime: &Runtime, event: Arc<InteractionEvent>) {
    let InteractionKind::Component { custom_id, values } = event.kind() else {
        return;
    };

    // the supervisor validated the id before routing; a parse failure here
    // means the event reached the wrong queue
    let custom = match CustomId::parse(custom_id) {
        Ok(custom) => custom,
        Err(parse_error) => {
            warn!(custom_id = %custom_id, error = %parse_error, "Unparsable component id");
            return;
        }
    };

    let definition = match engine.registry.get_component(custom.definition_id()) {
        Ok(definition) => definition,
        Err(lookup_error) => {
            error!(
                id = %custom.definition_id(),
                error = %lookup_error,
                "Component id does not resolve to a component definition"
            );
            engine
                .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
                .await;
            return;
        }
    };

    let args = values.iter().map(raw_to_arg).collect();
    let run_middlewares = !custom.is_independent() || engine.config.independent_middlewares;

    let ctx = InvocationContext::new(event, definition, args, runtime.kv());
    engine.finish(runtime, ctx, run_middlewares).await;
}
