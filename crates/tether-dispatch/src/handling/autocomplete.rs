//! Autocomplete handling.
//!
//! Autocomplete runs the middleware chain like every other interaction, but
//! its reply channel only carries suggestion choices: a cancellation or a
//! failing handler degrades to an empty choice list instead of an error
//! reply.

use std::sync::Arc;

use tracing::{debug, error};

use tether_core::definition::ArgValue;
use tether_core::event::{InteractionEvent, InteractionKind, OptionValue};
use tether_core::interactions::InteractionDefinition;

use super::Engine;
use crate::context::InvocationContext;
use crate::runtime::Runtime;

pub(crate) async fn handle(engine: &Engine, runtime: &Runtime, event: Arc<InteractionEvent>) {
    let InteractionKind::Autocomplete {
        command,
        focused,
        options,
    } = event.kind()
    else {
        return;
    };

    let Some(definition) = engine.registry.autocomplete_for(command) else {
        debug!(command = %command, "No autocomplete handler registered");
        return;
    };
    let InteractionDefinition::Autocomplete(autocomplete) = &*definition else {
        error!(command = %command, "Autocomplete index points at a non-autocomplete definition");
        return;
    };

    // the handler receives the focused option's name and its current text
    let current = options
        .iter()
        .find(|option| option.name == *focused)
        .map(|option| match &option.value {
            OptionValue::String(value) => value.clone(),
            OptionValue::Integer(value) => value.to_string(),
            OptionValue::Number(value) => value.to_string(),
            OptionValue::Boolean(value) => value.to_string(),
            _ => String::new(),
        })
        .unwrap_or_default();
    let args = vec![ArgValue::String(focused.clone()), ArgValue::String(current)];

    let mut ctx = InvocationContext::new(
        Arc::clone(&event),
        Arc::clone(&definition),
        args,
        runtime.kv(),
    );
    engine.middlewares.run(&mut ctx).await;
    if ctx.cancelled() {
        debug!(command = %command, "Autocomplete cancelled by middleware");
        if let Err(gateway_error) = event.hook().autocomplete(Vec::new()).await {
            debug!(error = %gateway_error, "Failed to send empty choice list");
        }
        return;
    }

    let invoke = Arc::clone(&autocomplete.invoke);
    let instance = runtime.instance(definition.controller());
    match invoke(instance, ctx.into_invocation()).await {
        Ok(choices) => {
            if let Err(gateway_error) = event.hook().autocomplete(choices).await {
                error!(error = %gateway_error, "Failed to send autocomplete choices");
            }
        }
        Err(handler_error) => {
            error!(
                command = %command,
                user = %event.user().name,
                error = %handler_error,
                "Autocomplete handler failed"
            );
            if let Err(gateway_error) = event.hook().autocomplete(Vec::new()).await {
                debug!(error = %gateway_error, "Failed to send empty choice list");
            }
        }
    }
}
