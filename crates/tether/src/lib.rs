//! # Tether
//!
//! A command and interaction dispatching framework for chat-platform bots.
//!
//! Applications declare commands, buttons, select menus and modals as
//! definitions bound to handler methods; Tether routes every inbound
//! interaction to the right method, adapting arguments, enforcing
//! permissions and cooldowns, and managing the reply lifecycle. Events
//! belonging to the same conversation are serialized onto one runtime,
//! while conversations run in parallel.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! #[derive(Default)]
//! struct GreetCmd;
//!
//! #[tokio::main]
//! async fn main() -> tether::AppResult<()> {
//!     TetherApp::builder()
//!         .definition(
//!             SlashCommandDefinition::builder::<GreetCmd>("greet")
//!                 .command("greet")
//!                 .option(OptionDescriptor::required("name", OptionKind::String))
//!                 .handler(|_cmd, inv| async move {
//!                     let name = inv.arg(0).as_str().unwrap_or("stranger");
//!                     Reply::new(format!("Hello, {name}!"))
//!                         .component(ComponentRef::of::<GreetCmd>("again"))
//!                 }),
//!         )
//!         .definition(
//!             ButtonDefinition::builder::<GreetCmd>("again")
//!                 .label("Greet again")
//!                 .handler(|_cmd, _inv| async move { "Hello again!" }),
//!         )
//!         .platform(Arc::new(MyPlatform::connect()?))
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub use tether_dispatch as dispatch;
pub use tether_runtime as runtime;

pub use tether_core::{
    ArgValue, ButtonDefinition, ButtonStyle, Choice, Component, ComponentRef, Constraint,
    ContextCommandDefinition, ContextTargetKind, ControllerDescriptor, CustomId, DefinitionId,
    DefinitionKind, EntitySelectDefinition, EntityTarget, EventSink, InteractionDefinition,
    InteractionEvent, InteractionKind, InteractionRegistry, Invocation, ModalDefinition,
    OptionDescriptor, OptionKind, OutboundPayload, Platform, Reply, ReplyConfig, ReplyHook,
    SelectOption, SlashCommandDefinition, StringSelectDefinition, TextField, UserRef,
};
pub use tether_dispatch::{
    DispatchConfig, ErrorMessageFactory, InvocationContext, Middleware, Priority, Supervisor,
    TypeAdapter, TypeAdapters,
};
pub use tether_runtime::{AppError, AppResult, TetherApp, TetherConfig};

/// Prelude for common imports.
pub mod prelude {
    pub use tether_core::{
        ArgValue, ButtonDefinition, ButtonStyle, Choice, ComponentRef, Constraint,
        ContextCommandDefinition, ContextTargetKind, EntitySelectDefinition, InteractionEvent,
        Invocation, ModalDefinition, OptionDescriptor, OptionKind, Reply, SelectOption,
        SlashCommandDefinition, StringSelectDefinition, TextField,
    };
    pub use tether_dispatch::{InvocationContext, Middleware, Priority};
    pub use tether_runtime::TetherApp;
}
