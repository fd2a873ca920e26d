//! # Tether Core
//!
//! Foundation types for the Tether interaction framework.
//!
//! Tether routes chat-platform interactions — commands, buttons, select
//! menus, modals — to handler methods declared by the application. This
//! crate provides everything the dispatch engine and platform adapters
//! agree on:
//!
//! - **Definitions**: immutable descriptions of one bound handler method
//!   ([`InteractionDefinition`]) plus the typed invocation closures that
//!   replace per-call reflection.
//! - **Registry**: the read-only lookup table over all definitions
//!   ([`InteractionRegistry`]).
//! - **Custom-Id Codec**: the `jdac.<scope>.<definitionId>` identifier
//!   stamped on interactive components ([`CustomId`]), tracing a component
//!   click back to the runtime that created it.
//! - **Events**: the classified inbound interaction model
//!   ([`InteractionEvent`]).
//! - **Replies**: declarative replies and their resolved wire form
//!   ([`Reply`], [`OutboundPayload`]).
//! - **Gateway**: the black-box platform abstraction ([`Platform`],
//!   [`ReplyHook`], [`EventSink`]).
//!
//! The dispatch engine itself lives in `tether-dispatch`; configuration and
//! bootstrap in `tether-runtime`.

pub mod custom_id;
pub mod definition;
pub mod error;
pub mod event;
pub mod gateway;
pub mod interactions;
pub mod kv;
pub mod registry;
pub mod reply;

pub use custom_id::{CustomId, Scope};
pub use definition::{
    ArgValue, Constraint, ConstraintKind, ControllerDescriptor, DefinitionId, Instance,
    Invocation, InvokeFn, OptionDescriptor, OptionKind, ReplyConfig, autocomplete_fn, invoke_fn,
};
pub use error::{BoxError, CustomIdError, GatewayError, GatewayResult, RegistryError,
    RegistryResult};
pub use event::{
    AttachmentRef, ChannelRef, ContextTarget, FieldInput, InteractionEvent, InteractionKind,
    Mentionable, MessageInput, OptionInput, OptionValue, RoleRef, UserRef,
};
pub use gateway::{EventSink, MessageRef, Platform, ReplyHook};
pub use interactions::{
    AutocompleteDefinition, ButtonDefinition, ContextCommandDefinition, ContextTargetKind,
    DefinitionKind, EntitySelectDefinition, InteractionDefinition, ModalDefinition,
    SlashCommandDefinition, StringSelectDefinition, TextField,
};
pub use kv::KeyValueStore;
pub use registry::{InteractionRegistry, RegistryBuilder};
pub use reply::{
    ButtonStyle, Choice, Component, ComponentRef, EntityTarget, IntoReply, OutboundPayload, Reply,
    SelectOption,
};
