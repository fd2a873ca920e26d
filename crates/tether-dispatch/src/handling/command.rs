//! Slash and context command handling.

use std::sync::Arc;

use tracing::{debug, error};

use tether_core::definition::ArgValue;
use tether_core::event::{ContextTarget, InteractionEvent, InteractionKind};
use tether_core::interactions::{ContextTargetKind, InteractionDefinition};

use super::Engine;
use crate::context::InvocationContext;
use crate::runtime::Runtime;
use crate::validate;

pub(crate) async fn slash(engine: &Engine, runtime: &Runtime, event: Arc<InteractionEvent>) {
    let InteractionKind::SlashCommand { command, options } = event.kind() else {
        return;
    };

    let definition = match engine.registry.command(command) {
        Ok(definition) => definition,
        Err(lookup_error) => {
            error!(command = %command, error = %lookup_error, "Unknown command");
            engine
                .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
                .await;
            return;
        }
    };
    let InteractionDefinition::SlashCommand(slash) = &*definition else {
        error!(command = %command, "Command name resolves to a non-slash definition");
        engine
            .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
            .await;
        return;
    };

    debug!(command = %command, "Type adapting arguments");
    let args = match engine.adapters.adapt_options(&slash.options, options) {
        Ok(args) => args,
        Err(adapt_error) => {
            debug!(error = %adapt_error, "Type adapting failed");
            let reply = engine.messages.type_adapting_failed(&adapt_error);
            engine
                .send_cancellation(runtime, &event, Some(&definition), reply)
                .await;
            return;
        }
    };

    if let Err(violation) = validate::check(&args, &slash.options) {
        debug!(option = %violation.option, "Constraint failed");
        let reply = engine.messages.constraint_failed(&violation);
        engine
            .send_cancellation(runtime, &event, Some(&definition), reply)
            .await;
        return;
    }

    let ctx = InvocationContext::new(event, definition, args, runtime.kv());
    engine.finish(runtime, ctx, true).await;
}

pub(crate) async fn context(engine: &Engine, runtime: &Runtime, event: Arc<InteractionEvent>) {
    let InteractionKind::ContextCommand { command, target } = event.kind() else {
        return;
    };

    let definition = match engine.registry.command(command) {
        Ok(definition) => definition,
        Err(lookup_error) => {
            error!(command = %command, error = %lookup_error, "Unknown context command");
            engine
                .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
                .await;
            return;
        }
    };
    let InteractionDefinition::ContextCommand(context) = &*definition else {
        error!(command = %command, "Command name resolves to a non-context definition");
        engine
            .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
            .await;
        return;
    };

    let argument = match (context.target, target) {
        (ContextTargetKind::User, ContextTarget::User(user)) => ArgValue::User(user.clone()),
        (ContextTargetKind::Message, ContextTarget::Message(message)) => {
            ArgValue::Message(message.clone())
        }
        (expected, _) => {
            error!(
                command = %command,
                expected = ?expected,
                "Context command target does not match its definition"
            );
            engine
                .send_cancellation(runtime, &event, None, engine.messages.unknown_interaction())
                .await;
            return;
        }
    };

    let ctx = InvocationContext::new(event, definition, vec![argument], runtime.kv());
    engine.finish(runtime, ctx, true).await;
}
