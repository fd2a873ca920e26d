//! Interaction definitions.
//!
//! A definition is the immutable description of one bound handler method:
//! its stable id, the controller it lives on, permission strings, reply
//! behaviour and kind-specific metadata. Definitions are built once at
//! startup — by hand or by a code-generation layer — and read-only
//! afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct GreetCmd;
//!
//! let greet = SlashCommandDefinition::builder::<GreetCmd>("greet")
//!     .command("greet")
//!     .option(OptionDescriptor::required("name", OptionKind::String))
//!     .handler(|_cmd, inv| async move {
//!         let name = inv.arg(0).as_str().unwrap_or("stranger").to_string();
//!         Reply::new(format!("Hello, {name}!"))
//!             .component(ComponentRef::of::<GreetCmd>("again"))
//!     });
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::definition::{
    AutocompleteFn, ControllerDescriptor, DefinitionId, Invocation, InvokeFn, OptionDescriptor,
    ReplyConfig, autocomplete_fn, invoke_fn,
};
use crate::error::BoxError;
use crate::reply::{ButtonStyle, Choice, EntityTarget, IntoReply, SelectOption};

/// The kind of an interaction definition, used in lookup diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    SlashCommand,
    ContextCommand,
    Autocomplete,
    Button,
    StringSelect,
    EntitySelect,
    Modal,
}

impl DefinitionKind {
    /// Kinds that may be referenced from a reply as message components.
    pub fn is_component(self) -> bool {
        matches!(
            self,
            DefinitionKind::Button | DefinitionKind::StringSelect | DefinitionKind::EntitySelect
        )
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefinitionKind::SlashCommand => "slash command",
            DefinitionKind::ContextCommand => "context command",
            DefinitionKind::Autocomplete => "autocomplete",
            DefinitionKind::Button => "button",
            DefinitionKind::StringSelect => "string select menu",
            DefinitionKind::EntitySelect => "entity select menu",
            DefinitionKind::Modal => "modal",
        };
        f.write_str(name)
    }
}

/// Target class of a context command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTargetKind {
    User,
    Message,
}

/// A single text input field of a modal.
#[derive(Debug, Clone)]
pub struct TextField {
    pub name: String,
    pub label: String,
    pub paragraph: bool,
    pub required: bool,
}

impl TextField {
    /// A single-line text field.
    pub fn short(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            paragraph: false,
            required: true,
        }
    }

    /// A multi-line text field.
    pub fn paragraph(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            paragraph: true,
            ..Self::short(name, label)
        }
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

// =============================================================================
// Definition variants
// =============================================================================

/// Metadata shared by every definition variant.
#[derive(Clone)]
pub struct DefinitionBase {
    pub id: DefinitionId,
    pub controller: ControllerDescriptor,
    pub permissions: Vec<String>,
    pub reply_config: ReplyConfig,
}

/// A slash command bound to a handler method.
#[derive(Clone)]
pub struct SlashCommandDefinition {
    pub base: DefinitionBase,
    /// Full platform-visible command name.
    pub command: String,
    pub description: String,
    pub options: Vec<OptionDescriptor>,
    /// Minimum delay between invocations per user; `None` disables the
    /// cooldown check.
    pub cooldown: Option<Duration>,
    pub invoke: InvokeFn,
}

/// A user or message context command.
#[derive(Clone)]
pub struct ContextCommandDefinition {
    pub base: DefinitionBase,
    pub command: String,
    pub target: ContextTargetKind,
    pub invoke: InvokeFn,
}

/// An autocomplete handler serving one or more slash commands.
#[derive(Clone)]
pub struct AutocompleteDefinition {
    pub base: DefinitionBase,
    /// Command names this handler provides suggestions for.
    pub commands: Vec<String>,
    pub invoke: AutocompleteFn,
}

/// A button bound to a handler method.
#[derive(Clone)]
pub struct ButtonDefinition {
    pub base: DefinitionBase,
    pub label: String,
    pub style: ButtonStyle,
    pub emoji: Option<String>,
    pub invoke: InvokeFn,
}

/// A string select menu bound to a handler method.
#[derive(Clone)]
pub struct StringSelectDefinition {
    pub base: DefinitionBase,
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    pub options: Vec<SelectOption>,
    pub invoke: InvokeFn,
}

/// An entity select menu bound to a handler method.
#[derive(Clone)]
pub struct EntitySelectDefinition {
    pub base: DefinitionBase,
    pub placeholder: Option<String>,
    pub targets: Vec<EntityTarget>,
    pub invoke: InvokeFn,
}

/// A modal bound to a handler method receiving the submitted fields.
#[derive(Clone)]
pub struct ModalDefinition {
    pub base: DefinitionBase,
    pub title: String,
    pub fields: Vec<TextField>,
    pub invoke: InvokeFn,
}

/// One registered interaction definition.
#[derive(Clone)]
pub enum InteractionDefinition {
    SlashCommand(SlashCommandDefinition),
    ContextCommand(ContextCommandDefinition),
    Autocomplete(AutocompleteDefinition),
    Button(ButtonDefinition),
    StringSelect(StringSelectDefinition),
    EntitySelect(EntitySelectDefinition),
    Modal(ModalDefinition),
}

impl InteractionDefinition {
    /// Shared metadata of this definition.
    pub fn base(&self) -> &DefinitionBase {
        match self {
            InteractionDefinition::SlashCommand(def) => &def.base,
            InteractionDefinition::ContextCommand(def) => &def.base,
            InteractionDefinition::Autocomplete(def) => &def.base,
            InteractionDefinition::Button(def) => &def.base,
            InteractionDefinition::StringSelect(def) => &def.base,
            InteractionDefinition::EntitySelect(def) => &def.base,
            InteractionDefinition::Modal(def) => &def.base,
        }
    }

    pub fn id(&self) -> &DefinitionId {
        &self.base().id
    }

    pub fn kind(&self) -> DefinitionKind {
        match self {
            InteractionDefinition::SlashCommand(_) => DefinitionKind::SlashCommand,
            InteractionDefinition::ContextCommand(_) => DefinitionKind::ContextCommand,
            InteractionDefinition::Autocomplete(_) => DefinitionKind::Autocomplete,
            InteractionDefinition::Button(_) => DefinitionKind::Button,
            InteractionDefinition::StringSelect(_) => DefinitionKind::StringSelect,
            InteractionDefinition::EntitySelect(_) => DefinitionKind::EntitySelect,
            InteractionDefinition::Modal(_) => DefinitionKind::Modal,
        }
    }

    pub fn controller(&self) -> &ControllerDescriptor {
        &self.base().controller
    }

    pub fn permissions(&self) -> &[String] {
        &self.base().permissions
    }

    pub fn reply_config(&self) -> ReplyConfig {
        self.base().reply_config
    }

    /// The stored invocation closure; `None` for autocomplete definitions,
    /// which use [`Self::autocomplete_invoke`] instead.
    pub fn invoke(&self) -> Option<&InvokeFn> {
        match self {
            InteractionDefinition::SlashCommand(def) => Some(&def.invoke),
            InteractionDefinition::ContextCommand(def) => Some(&def.invoke),
            InteractionDefinition::Autocomplete(_) => None,
            InteractionDefinition::Button(def) => Some(&def.invoke),
            InteractionDefinition::StringSelect(def) => Some(&def.invoke),
            InteractionDefinition::EntitySelect(def) => Some(&def.invoke),
            InteractionDefinition::Modal(def) => Some(&def.invoke),
        }
    }

    /// The stored autocomplete closure, for autocomplete definitions.
    pub fn autocomplete_invoke(&self) -> Option<&AutocompleteFn> {
        match self {
            InteractionDefinition::Autocomplete(def) => Some(&def.invoke),
            _ => None,
        }
    }

    /// A human-readable display name for logs.
    pub fn display_name(&self) -> String {
        match self {
            InteractionDefinition::SlashCommand(def) => format!("/{}", def.command),
            InteractionDefinition::ContextCommand(def) => def.command.clone(),
            _ => self.id().as_str().to_string(),
        }
    }
}

impl fmt::Debug for InteractionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionDefinition")
            .field("id", self.id())
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builders
// =============================================================================

macro_rules! base_builder_methods {
    () => {
        /// Adds a required permission string.
        pub fn permission(mut self, permission: impl Into<String>) -> Self {
            self.base.permissions.push(permission.into());
            self
        }

        /// Sets whether replies default to ephemeral.
        pub fn ephemeral(mut self, ephemeral: bool) -> Self {
            self.base.reply_config.ephemeral = ephemeral;
            self
        }

        /// Sets the reply behaviour wholesale.
        pub fn reply_config(mut self, config: ReplyConfig) -> Self {
            self.base.reply_config = config;
            self
        }
    };
}

fn base_for<C: Default + Send + Sync + 'static>(method: &str) -> DefinitionBase {
    let controller = ControllerDescriptor::of::<C>();
    DefinitionBase {
        id: DefinitionId::new(controller.name(), method),
        controller,
        permissions: Vec::new(),
        reply_config: ReplyConfig::default(),
    }
}

/// Builder for [`SlashCommandDefinition`]; `handler` is the terminal call.
pub struct SlashCommandBuilder<C> {
    base: DefinitionBase,
    command: String,
    description: String,
    options: Vec<OptionDescriptor>,
    cooldown: Option<Duration>,
    _controller: PhantomData<fn() -> C>,
}

impl SlashCommandDefinition {
    /// Starts building a slash command handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> SlashCommandBuilder<C> {
        SlashCommandBuilder {
            base: base_for::<C>(method),
            command: method.to_string(),
            description: String::new(),
            options: Vec::new(),
            cooldown: None,
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> SlashCommandBuilder<C> {
    base_builder_methods!();

    /// Sets the platform-visible command name; defaults to the method name.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets the command description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declares an option.
    pub fn option(mut self, option: OptionDescriptor) -> Self {
        self.options.push(option);
        self
    }

    /// Sets the per-user cooldown between invocations.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::SlashCommand(SlashCommandDefinition {
            base: self.base,
            command: self.command,
            description: self.description,
            options: self.options,
            cooldown: self.cooldown,
            invoke: invoke_fn(f),
        })
    }
}

/// Builder for [`ContextCommandDefinition`]; `handler` is the terminal call.
pub struct ContextCommandBuilder<C> {
    base: DefinitionBase,
    command: String,
    target: ContextTargetKind,
    _controller: PhantomData<fn() -> C>,
}

impl ContextCommandDefinition {
    /// Starts building a context command handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(
        method: &str,
        target: ContextTargetKind,
    ) -> ContextCommandBuilder<C> {
        ContextCommandBuilder {
            base: base_for::<C>(method),
            command: method.to_string(),
            target,
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> ContextCommandBuilder<C> {
    base_builder_methods!();

    /// Sets the platform-visible command name.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::ContextCommand(ContextCommandDefinition {
            base: self.base,
            command: self.command,
            target: self.target,
            invoke: invoke_fn(f),
        })
    }
}

/// Builder for [`AutocompleteDefinition`]; `handler` is the terminal call.
pub struct AutocompleteBuilder<C> {
    base: DefinitionBase,
    commands: Vec<String>,
    _controller: PhantomData<fn() -> C>,
}

impl AutocompleteDefinition {
    /// Starts building an autocomplete handler `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> AutocompleteBuilder<C> {
        AutocompleteBuilder {
            base: base_for::<C>(method),
            commands: Vec::new(),
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> AutocompleteBuilder<C> {
    base_builder_methods!();

    /// Adds a command name this handler serves.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Choice>, BoxError>> + Send + 'static,
    {
        InteractionDefinition::Autocomplete(AutocompleteDefinition {
            base: self.base,
            commands: self.commands,
            invoke: autocomplete_fn(f),
        })
    }
}

/// Builder for [`ButtonDefinition`]; `handler` is the terminal call.
pub struct ButtonBuilder<C> {
    base: DefinitionBase,
    label: String,
    style: ButtonStyle,
    emoji: Option<String>,
    _controller: PhantomData<fn() -> C>,
}

impl ButtonDefinition {
    /// Starts building a button handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> ButtonBuilder<C> {
        ButtonBuilder {
            base: base_for::<C>(method),
            label: String::new(),
            style: ButtonStyle::default(),
            emoji: None,
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> ButtonBuilder<C> {
    base_builder_methods!();

    /// Sets the button label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the button style.
    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the button emoji.
    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::Button(ButtonDefinition {
            base: self.base,
            label: self.label,
            style: self.style,
            emoji: self.emoji,
            invoke: invoke_fn(f),
        })
    }
}

/// Builder for [`StringSelectDefinition`]; `handler` is the terminal call.
pub struct StringSelectBuilder<C> {
    base: DefinitionBase,
    placeholder: Option<String>,
    min_values: u8,
    max_values: u8,
    options: Vec<SelectOption>,
    _controller: PhantomData<fn() -> C>,
}

impl StringSelectDefinition {
    /// Starts building a string select menu handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> StringSelectBuilder<C> {
        StringSelectBuilder {
            base: base_for::<C>(method),
            placeholder: None,
            min_values: 1,
            max_values: 1,
            options: Vec::new(),
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> StringSelectBuilder<C> {
    base_builder_methods!();

    /// Sets the placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the minimum number of selected values.
    pub fn min_values(mut self, min: u8) -> Self {
        self.min_values = min;
        self
    }

    /// Sets the maximum number of selected values.
    pub fn max_values(mut self, max: u8) -> Self {
        self.max_values = max;
        self
    }

    /// Adds a selectable option.
    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::StringSelect(StringSelectDefinition {
            base: self.base,
            placeholder: self.placeholder,
            min_values: self.min_values,
            max_values: self.max_values,
            options: self.options,
            invoke: invoke_fn(f),
        })
    }
}

/// Builder for [`EntitySelectDefinition`]; `handler` is the terminal call.
pub struct EntitySelectBuilder<C> {
    base: DefinitionBase,
    placeholder: Option<String>,
    targets: Vec<EntityTarget>,
    _controller: PhantomData<fn() -> C>,
}

impl EntitySelectDefinition {
    /// Starts building an entity select menu handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> EntitySelectBuilder<C> {
        EntitySelectBuilder {
            base: base_for::<C>(method),
            placeholder: None,
            targets: Vec::new(),
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> EntitySelectBuilder<C> {
    base_builder_methods!();

    /// Sets the placeholder text.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Adds an entity class offered by the menu.
    pub fn target(mut self, target: EntityTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::EntitySelect(EntitySelectDefinition {
            base: self.base,
            placeholder: self.placeholder,
            targets: self.targets,
            invoke: invoke_fn(f),
        })
    }
}

/// Builder for [`ModalDefinition`]; `handler` is the terminal call.
pub struct ModalBuilder<C> {
    base: DefinitionBase,
    title: String,
    fields: Vec<TextField>,
    _controller: PhantomData<fn() -> C>,
}

impl ModalDefinition {
    /// Starts building a modal handled by `C::method`.
    pub fn builder<C: Default + Send + Sync + 'static>(method: &str) -> ModalBuilder<C> {
        ModalBuilder {
            base: base_for::<C>(method),
            title: String::new(),
            fields: Vec::new(),
            _controller: PhantomData,
        }
    }
}

impl<C: Default + Send + Sync + 'static> ModalBuilder<C> {
    base_builder_methods!();

    /// Sets the modal title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Adds a text input field.
    pub fn field(mut self, field: TextField) -> Self {
        self.fields.push(field);
        self
    }

    /// Binds the handler and finishes the definition.
    pub fn handler<F, Fut, R>(self, f: F) -> InteractionDefinition
    where
        F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        InteractionDefinition::Modal(ModalDefinition {
            base: self.base,
            title: self.title,
            fields: self.fields,
            invoke: invoke_fn(f),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::OptionKind;
    use crate::reply::Reply;

    #[derive(Default)]
    struct GreetCmd;

    #[test]
    fn slash_builder_produces_expected_metadata() {
        let definition = SlashCommandDefinition::builder::<GreetCmd>("greet")
            .command("greet")
            .description("Greets someone")
            .option(OptionDescriptor::required("name", OptionKind::String))
            .permission("greet.use")
            .ephemeral(true)
            .handler(|_cmd, _inv| async move { Reply::new("hi") });

        assert_eq!(definition.id().as_str(), "GreetCmd.greet");
        assert_eq!(definition.kind(), DefinitionKind::SlashCommand);
        assert_eq!(definition.permissions(), ["greet.use"]);
        assert!(definition.reply_config().ephemeral);
        assert!(definition.invoke().is_some());
        assert!(definition.autocomplete_invoke().is_none());
    }

    #[test]
    fn button_builder_produces_component_kind() {
        let definition = ButtonDefinition::builder::<GreetCmd>("again")
            .label("Greet again")
            .style(ButtonStyle::Secondary)
            .handler(|_cmd, _inv| async move {});

        assert_eq!(definition.kind(), DefinitionKind::Button);
        assert!(definition.kind().is_component());
        assert_eq!(definition.id().as_str(), "GreetCmd.again");
    }
}
