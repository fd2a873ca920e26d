//! Declarative replies and their resolved wire form.
//!
//! Handlers describe what to send with a [`Reply`]: text, behaviour flags
//! and *references* to component definitions. The dispatch engine resolves
//! those references against the registry and stamps each component with a
//! custom id binding it to the owning runtime, producing an
//! [`OutboundPayload`] ready for the gateway.

use serde::Serialize;

use crate::definition::DefinitionId;
use crate::error::BoxError;

// =============================================================================
// Declarative reply
// =============================================================================

/// A reference to a component definition, attached to a [`Reply`] before
/// resolution. The scope of the stamped custom id depends on `independent`:
/// bound components route back to the runtime that sent them, independent
/// components stay routable forever.
#[derive(Debug, Clone)]
pub struct ComponentRef {
    pub definition: DefinitionId,
    pub independent: bool,
}

impl ComponentRef {
    /// References a runtime-bound component.
    pub fn new(definition: DefinitionId) -> Self {
        Self {
            definition,
            independent: false,
        }
    }

    /// References a runtime-bound component by controller type and method
    /// name.
    pub fn of<C: 'static>(method: &str) -> Self {
        Self::new(DefinitionId::of::<C>(method))
    }

    /// Marks the reference as independent of any runtime.
    pub fn independent(mut self) -> Self {
        self.independent = true;
        self
    }
}

/// A handler's declarative reply.
///
/// Behaviour flags default to the owning definition's
/// [`ReplyConfig`](crate::definition::ReplyConfig); setting them here
/// overrides the definition for this reply only.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub content: String,
    pub ephemeral: Option<bool>,
    pub edit: Option<bool>,
    pub keep_components: Option<bool>,
    pub components: Vec<ComponentRef>,
}

impl Reply {
    /// Creates a reply with the given text content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Overrides the ephemeral flag for this reply.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    /// Overrides whether this reply edits the latest sent message.
    pub fn edit(mut self, edit: bool) -> Self {
        self.edit = Some(edit);
        self
    }

    /// Overrides whether editing keeps the message's existing components.
    pub fn keep_components(mut self, keep: bool) -> Self {
        self.keep_components = Some(keep);
        self
    }

    /// Attaches a component reference.
    pub fn component(mut self, component: ComponentRef) -> Self {
        self.components.push(component);
        self
    }
}

// =============================================================================
// Resolved components
// =============================================================================

/// Visual style of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

/// One choice of a string select menu.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Entity classes an entity select menu offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTarget {
    User,
    Role,
    Channel,
}

/// A fully resolved component, custom id included.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<String>,
    },
    StringSelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        min_values: u8,
        max_values: u8,
        options: Vec<SelectOption>,
    },
    EntitySelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        targets: Vec<EntityTarget>,
    },
}

impl Component {
    /// The custom id stamped on this component.
    pub fn custom_id(&self) -> &str {
        match self {
            Component::Button { custom_id, .. } => custom_id,
            Component::StringSelect { custom_id, .. } => custom_id,
            Component::EntitySelect { custom_id, .. } => custom_id,
        }
    }
}

/// The final payload handed to the gateway.
///
/// `components: None` means "leave the message's components untouched" and
/// only occurs on edits.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundPayload {
    pub content: String,
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

impl OutboundPayload {
    /// A plain text payload without components.
    pub fn text(content: impl Into<String>, ephemeral: bool) -> Self {
        Self {
            content: content.into(),
            ephemeral,
            components: Some(Vec::new()),
        }
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// IntoReply
// =============================================================================

/// Conversion of handler return values into an optional [`Reply`].
///
/// Implemented for the common shapes so handler bodies stay terse: return
/// `()` for no reply, a `String` or [`Reply`] to send one, and wrap any of
/// those in `Option`/`Result` as needed.
pub trait IntoReply: Send {
    fn into_reply(self) -> Result<Option<Reply>, BoxError>;
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(None)
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(Some(self))
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(Some(Reply::new(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(Some(Reply::new(self)))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        match self {
            Some(inner) => inner.into_reply(),
            None => Ok(None),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError> + Send,
{
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        match self {
            Ok(inner) => inner.into_reply(),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_reply_shapes() {
        assert!(().into_reply().unwrap().is_none());
        assert_eq!(
            "hi".into_reply().unwrap().map(|r| r.content),
            Some("hi".to_string())
        );
        let nested: Result<Option<Reply>, std::io::Error> = Ok(Some(Reply::new("ok")));
        assert_eq!(
            nested.into_reply().unwrap().map(|r| r.content),
            Some("ok".to_string())
        );
        let failed: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        assert!(failed.into_reply().is_err());
    }

    #[test]
    fn reply_builder_overrides() {
        let reply = Reply::new("hello")
            .ephemeral(true)
            .edit(false)
            .component(ComponentRef::new(DefinitionId::new("GreetCmd", "again")).independent());
        assert_eq!(reply.ephemeral, Some(true));
        assert_eq!(reply.edit, Some(false));
        assert!(reply.components[0].independent);
    }
}
