//! Reply resolution and delivery.
//!
//! Turns a handler's declarative [`Reply`] into an [`OutboundPayload`]:
//! component references are looked up in the registry, stamped with a
//! custom id scoped to the owning runtime (or the independent marker), and
//! the payload is sent — or, for edit-in-place replies, used to edit the
//! runtime's most recently sent message.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use tether_core::custom_id::CustomId;
use tether_core::error::{CustomIdError, GatewayError, RegistryError};
use tether_core::event::InteractionEvent;
use tether_core::interactions::InteractionDefinition;
use tether_core::reply::{Component, ComponentRef, OutboundPayload, Reply};

use crate::handling::Engine;
use crate::runtime::Runtime;

/// Errors surfacing while resolving or delivering a reply.
#[derive(Debug, Error)]
pub enum DeliverError {
    /// A referenced component definition does not exist or has the wrong
    /// kind.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Stamping a custom id failed.
    #[error(transparent)]
    CustomId(#[from] CustomIdError),

    /// The gateway rejected the payload.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Resolves and delivers replies for one invocation.
pub(crate) struct ReplyPipeline<'a> {
    engine: &'a Engine,
    runtime: &'a Runtime,
    event: &'a Arc<InteractionEvent>,
    definition: Option<&'a Arc<InteractionDefinition>>,
}

impl<'a> ReplyPipeline<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        runtime: &'a Runtime,
        event: &'a Arc<InteractionEvent>,
        definition: Option<&'a Arc<InteractionDefinition>>,
    ) -> Self {
        Self {
            engine,
            runtime,
            event,
            definition,
        }
    }

    /// Resolves the reply against the registry and sends (or edits) it.
    ///
    /// The sent message becomes the runtime's latest reply, so a later
    /// edit-in-place reply targets it.
    pub(crate) async fn deliver(&self, reply: Reply) -> Result<(), DeliverError> {
        let config = self
            .definition
            .map(|definition| definition.reply_config())
            .unwrap_or_default();

        let ephemeral = reply.ephemeral.unwrap_or(config.ephemeral);
        let edit = reply.edit.unwrap_or(config.edit_reply);
        let keep_components = reply.keep_components.unwrap_or(config.keep_components);
        let latest = self.runtime.latest_reply();

        let components = if reply.components.is_empty() && keep_components && edit && latest.is_some()
        {
            // leave the edited message's components untouched
            None
        } else {
            let mut resolved = Vec::with_capacity(reply.components.len());
            for component in &reply.components {
                resolved.push(self.resolve_component(component)?);
            }
            Some(resolved)
        };

        let payload = OutboundPayload {
            content: reply.content,
            ephemeral,
            components,
        };

        let hook = self.event.hook();
        let sent = match latest.filter(|_| edit) {
            Some(message) => {
                debug!(message = message.id, "Editing latest reply in place");
                hook.edit(message, payload).await?
            }
            None => hook.send(payload).await?,
        };
        self.runtime.set_latest_reply(sent);
        Ok(())
    }

    /// Looks up a component reference and stamps it with its custom id.
    ///
    /// Resolving a non-component definition is a reportable error, never a
    /// silent fallback.
    fn resolve_component(&self, reference: &ComponentRef) -> Result<Component, DeliverError> {
        let definition = self.engine.registry.get_component(&reference.definition)?;

        let custom_id = if reference.independent {
            CustomId::independent(reference.definition.clone())
        } else {
            CustomId::bound(self.runtime.id(), reference.definition.clone())?
        }
        .to_string();

        let component = match &*definition {
            InteractionDefinition::Button(button) => Component::Button {
                custom_id,
                label: button.label.clone(),
                style: button.style,
                emoji: button.emoji.clone(),
            },
            InteractionDefinition::StringSelect(menu) => Component::StringSelect {
                custom_id,
                placeholder: menu.placeholder.clone(),
                min_values: menu.min_values,
                max_values: menu.max_values,
                options: menu.options.clone(),
            },
            InteractionDefinition::EntitySelect(menu) => Component::EntitySelect {
                custom_id,
                placeholder: menu.placeholder.clone(),
                targets: menu.targets.clone(),
            },
            other => {
                return Err(RegistryError::KindMismatch {
                    id: reference.definition.as_str().to_string(),
                    expected: tether_core::interactions::DefinitionKind::Button,
                    actual: other.kind(),
                }
                .into());
            }
        };
        Ok(component)
    }
}

/// Flattens a reply into a bare payload without component resolution.
///
/// Used where no runtime scope exists yet, e.g. the supervisor's
/// unknown-interaction reply.
pub(crate) fn bare_payload(reply: &Reply, default_ephemeral: bool) -> OutboundPayload {
    OutboundPayload::text(
        reply.content.clone(),
        reply.ephemeral.unwrap_or(default_ephemeral),
    )
}
