//! Building blocks shared by all interaction definitions.
//!
//! A definition binds one handler method to one platform interaction. The
//! pieces living here are the stable [`DefinitionId`], the
//! [`ControllerDescriptor`] (how to obtain the handler's controller
//! instance), the typed invocation closures that replace any form of runtime
//! reflection, and the argument model produced by the type pipeline.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use crate::error::{BoxError, CustomIdError};
use crate::event::{
    AttachmentRef, ChannelRef, InteractionEvent, Mentionable, MessageInput, RoleRef, UserRef,
};
use crate::kv::KeyValueStore;
use crate::reply::{Choice, IntoReply, Reply};

// =============================================================================
// Definition Id
// =============================================================================

/// Stable identifier of one interaction definition.
///
/// Derived deterministically from the declaring controller's type name and
/// the handler method name, e.g. `GreetCmd.on_button`. The string form is
/// embedded into component custom ids and therefore restricted to
/// identifier characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(String);

impl DefinitionId {
    /// Creates a definition id from a controller name and a method name.
    pub fn new(controller: &str, method: &str) -> Self {
        Self(format!("{controller}.{method}"))
    }

    /// Creates a definition id for a method on controller type `C`.
    pub fn of<C: 'static>(method: &str) -> Self {
        Self::new(short_type_name::<C>(), method)
    }

    /// Parses a `Controller.method` pair, validating its shape.
    pub fn parse(raw: &str) -> Result<Self, CustomIdError> {
        let mut parts = raw.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(controller), Some(method), None)
                if is_identifier(controller) && is_identifier(method) =>
            {
                Ok(Self::new(controller, method))
            }
            _ => Err(CustomIdError::InvalidDefinitionId(raw.to_string())),
        }
    }

    /// Returns the full `Controller.method` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the controller segment.
    pub fn controller(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Returns the method segment.
    pub fn method(&self) -> &str {
        self.0.split('.').nth(1).unwrap_or("")
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Returns the unqualified name of a type, without its module path.
pub fn short_type_name<C: 'static>() -> &'static str {
    let name = type_name::<C>();
    name.rsplit("::").next().unwrap_or(name)
}

// =============================================================================
// Controller Descriptor
// =============================================================================

/// A controller instance, cached per runtime and shared across that
/// runtime's handler invocations. Controllers keep mutable state behind
/// interior mutability; the per-runtime serialization guarantee means such
/// state is never contended by two events of the same conversation.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Describes the controller type a definition's handler method lives on:
/// its [`TypeId`] (the instance-cache key), its unqualified name (the first
/// segment of the [`DefinitionId`]) and a factory producing fresh instances.
#[derive(Clone)]
pub struct ControllerDescriptor {
    type_id: TypeId,
    name: &'static str,
    factory: Arc<dyn Fn() -> Instance + Send + Sync>,
}

impl ControllerDescriptor {
    /// Describes a controller constructed via [`Default`].
    pub fn of<C: Default + Send + Sync + 'static>() -> Self {
        Self::with_factory(C::default)
    }

    /// Describes a controller constructed by a custom factory, e.g. one
    /// provided by a dependency-injection container.
    pub fn with_factory<C, F>(factory: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<C>(),
            name: short_type_name::<C>(),
            factory: Arc::new(move || Arc::new(factory()) as Instance),
        }
    }

    /// Returns the controller's type id.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the controller's unqualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Creates a fresh controller instance.
    pub fn instantiate(&self) -> Instance {
        (self.factory)()
    }
}

impl fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Invocation
// =============================================================================

/// Everything a handler method receives: the originating event, the adapted
/// argument list and the owning runtime's scratch store.
#[derive(Clone)]
pub struct Invocation {
    /// The interaction event that triggered this invocation.
    pub event: Arc<InteractionEvent>,
    /// Arguments produced by the type/constraint pipeline, in declaration
    /// order.
    pub args: Vec<ArgValue>,
    /// Key/value store shared by all invocations on the same runtime.
    pub kv: KeyValueStore,
}

impl Invocation {
    /// Returns the argument at `index`, or [`ArgValue::Absent`] when out of
    /// range.
    pub fn arg(&self, index: usize) -> &ArgValue {
        self.args.get(index).unwrap_or(&ArgValue::Absent)
    }
}

/// Future returned by a stored invocation closure.
pub type InvokeFuture = BoxFuture<'static, Result<Option<Reply>, BoxError>>;

/// Type-erased handler bound to a definition.
///
/// Built once at registration time; invoked with the runtime-cached
/// controller instance and the prepared [`Invocation`].
pub type InvokeFn = Arc<dyn Fn(Instance, Invocation) -> InvokeFuture + Send + Sync>;

/// Future returned by a stored autocomplete closure.
pub type AutocompleteFuture = BoxFuture<'static, Result<Vec<Choice>, BoxError>>;

/// Type-erased autocomplete handler; returns choices instead of a reply.
pub type AutocompleteFn = Arc<dyn Fn(Instance, Invocation) -> AutocompleteFuture + Send + Sync>;

/// Wraps a typed async handler into an [`InvokeFn`].
///
/// The controller type must match the [`ControllerDescriptor`] of the owning
/// definition; the builders enforce this statically.
pub fn invoke_fn<C, F, Fut, R>(f: F) -> InvokeFn
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    Arc::new(move |instance, invocation| -> InvokeFuture {
        match instance.downcast::<C>() {
            Ok(controller) => {
                let fut = f(controller, invocation);
                Box::pin(async move { fut.await.into_reply() })
            }
            Err(_) => Box::pin(future::ready(Err(instance_mismatch::<C>()))),
        }
    })
}

/// Wraps a typed async autocomplete handler into an [`AutocompleteFn`].
pub fn autocomplete_fn<C, F, Fut>(f: F) -> AutocompleteFn
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Choice>, BoxError>> + Send + 'static,
{
    Arc::new(move |instance, invocation| -> AutocompleteFuture {
        match instance.downcast::<C>() {
            Ok(controller) => Box::pin(f(controller, invocation)),
            Err(_) => Box::pin(future::ready(Err(instance_mismatch::<C>()))),
        }
    })
}

fn instance_mismatch<C>() -> BoxError {
    format!(
        "controller instance does not match handler type '{}'",
        type_name::<C>()
    )
    .into()
}

// =============================================================================
// Options & Arguments
// =============================================================================

/// Declared kind of a command option, mirroring the platform's option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

impl OptionKind {
    /// Kinds whose absence cannot be represented by the platform's own
    /// value model; optional options of these kinds should declare a
    /// default.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            OptionKind::Integer | OptionKind::Number | OptionKind::Boolean
        )
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKind::String => "string",
            OptionKind::Integer => "integer",
            OptionKind::Number => "number",
            OptionKind::Boolean => "boolean",
            OptionKind::User => "user",
            OptionKind::Channel => "channel",
            OptionKind::Role => "role",
            OptionKind::Mentionable => "mentionable",
            OptionKind::Attachment => "attachment",
        };
        f.write_str(name)
    }
}

/// Declares one parameter of a slash command.
#[derive(Debug, Clone)]
pub struct OptionDescriptor {
    /// Platform-visible option name.
    pub name: String,
    /// Human-readable description shown by the platform client.
    pub description: String,
    /// Declared kind; selects the type adapter.
    pub kind: OptionKind,
    /// Whether the platform requires the user to supply a value.
    pub required: bool,
    /// Default value, run through the same adapter when the option is
    /// absent from the input.
    pub default: Option<String>,
    /// Constraints validated against the adapted value, in order.
    pub constraints: Vec<Constraint>,
}

impl OptionDescriptor {
    /// Declares a required option.
    pub fn required(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            required: true,
            default: None,
            constraints: Vec::new(),
        }
    }

    /// Declares an optional option.
    pub fn optional(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Sets the option description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the default value used when the option is absent.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Adds a constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// A single validation rule attached to an option.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// What to check.
    pub kind: ConstraintKind,
    /// Message shown to the user when the check fails; a generic message
    /// is generated when unset.
    pub message: Option<String>,
}

/// The closed set of built-in constraint checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    /// Numeric lower bound (inclusive).
    Min(i64),
    /// Numeric upper bound (inclusive).
    Max(i64),
    /// Minimum string length in characters.
    MinLength(usize),
    /// Maximum string length in characters.
    MaxLength(usize),
}

impl Constraint {
    pub fn min(bound: i64) -> Self {
        Self {
            kind: ConstraintKind::Min(bound),
            message: None,
        }
    }

    pub fn max(bound: i64) -> Self {
        Self {
            kind: ConstraintKind::Max(bound),
            message: None,
        }
    }

    pub fn min_length(bound: usize) -> Self {
        Self {
            kind: ConstraintKind::MinLength(bound),
            message: None,
        }
    }

    pub fn max_length(bound: usize) -> Self {
        Self {
            kind: ConstraintKind::MaxLength(bound),
            message: None,
        }
    }

    /// Sets the user-facing failure message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// An argument after type adaptation, handed to the handler method.
#[derive(Debug, Clone, Default)]
pub enum ArgValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    User(UserRef),
    Channel(ChannelRef),
    Role(RoleRef),
    Mentionable(Mentionable),
    Attachment(AttachmentRef),
    /// Target message of a message context command.
    Message(MessageInput),
    /// Sentinel for an optional option the user did not supply.
    #[default]
    Absent,
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(value) => Some(*value),
            ArgValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserRef> {
        match self {
            ArgValue::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ArgValue::Absent)
    }

    /// Short name of the contained value's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            ArgValue::String(_) => "string",
            ArgValue::Int(_) => "integer",
            ArgValue::Float(_) => "number",
            ArgValue::Bool(_) => "boolean",
            ArgValue::User(_) => "user",
            ArgValue::Channel(_) => "channel",
            ArgValue::Role(_) => "role",
            ArgValue::Mentionable(_) => "mentionable",
            ArgValue::Attachment(_) => "attachment",
            ArgValue::Message(_) => "message",
            ArgValue::Absent => "absent",
        }
    }
}

// =============================================================================
// Reply Config
// =============================================================================

/// Per-definition reply behaviour, overridable per [`Reply`].
#[derive(Debug, Clone, Copy)]
pub struct ReplyConfig {
    /// Whether replies are only visible to the invoking user.
    pub ephemeral: bool,
    /// Whether a reply edits the runtime's latest sent message instead of
    /// sending a new one.
    pub edit_reply: bool,
    /// Whether editing keeps the components already attached to the
    /// message.
    pub keep_components: bool,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            ephemeral: false,
            edit_reply: true,
            keep_components: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;

    #[test]
    fn definition_id_shape() {
        let id = DefinitionId::new("GreetCmd", "greet");
        assert_eq!(id.as_str(), "GreetCmd.greet");
        assert_eq!(id.controller(), "GreetCmd");
        assert_eq!(id.method(), "greet");
        assert_eq!(DefinitionId::of::<Greeter>("hi").as_str(), "Greeter.hi");
    }

    #[test]
    fn definition_id_rejects_bad_shapes() {
        for raw in ["", "NoMethod", "a.b.c", "Greet Cmd.m", ".m", "C."] {
            assert!(DefinitionId::parse(raw).is_err(), "accepted {raw:?}");
        }
        assert!(DefinitionId::parse("GreetCmd.on_button").is_ok());
    }

    #[test]
    fn controller_factory_creates_distinct_instances() {
        #[derive(Default)]
        struct Counter;

        let descriptor = ControllerDescriptor::of::<Counter>();
        assert_eq!(descriptor.name(), "Counter");
        let a = descriptor.instantiate();
        let b = descriptor.instantiate();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(a.downcast::<Counter>().is_ok());
    }
}
