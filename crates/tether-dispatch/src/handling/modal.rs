//! Modal submit handling.

use std::sync::Arc;

use tracing::{error, warn};

use tether_core::custom_id::CustomId;
use tether_core::definition::ArgValue;
use tether_core::event::{InteractionEvent, InteractionKind};
use tether_core::interactions::{DefinitionKind, InteractionDefinition};

use super::Engine;
use crate::context::InvocationContext;
use crate::runtime::Runtime;

pub(crate) async fn handle(engine: &Engine, runtime: &Runtime, event: Arc<InteractionEvent>) {
    let InteractionKind::Modal { custom_id, fields } = event.kind() else {
        return;
    };

    let custom = match CustomId::parse(custom_id) {
        Ok(custom) => custom,
        Err(parse_error) => {
            warn!(custom_id = %custom_id, error = %parse_error, "Unparsable modal id");
            return;
        }
    };

    let definition = match engine
        .registry
        .get(custom.definition_id(), DefinitionKind::Modal)
    {
        Ok(definition) => definition,
        Err(lookup_error) => {
            error!(
                id = %custom.definition_id(),
                error = %lookup_error,
                "Modal id does not resolve to a modal definition"
            );
            engine
                .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
                .await;
            return;
        }
    };
    let InteractionDefinition::Modal(modal) = &*definition else {
        return;
    };

    // submitted values in declared field order; absent optional fields
    // surface as the absence sentinel
    let args = modal
        .fields
        .iter()
        .map(|field| {
            fields
                .iter()
                .find(|input| input.name == field.name)
                .map(|input| ArgValue::String(input.value.clone()))
                .unwrap_or(ArgValue::Absent)
        })
        .collect();

    let run_middlewares = !custom.is_independent() || engine.config.independent_middlewares;
    let ctx = InvocationContext::new(event, definition, args, runtime.kv());
    engine.finish(runtime, ctx, run_middlewares).await;
}
