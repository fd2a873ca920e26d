//! The inbound interaction event model.
//!
//! Platform adapters translate whatever their client library delivers into
//! an [`InteractionEvent`] and push it into the dispatcher. The event
//! carries the classified [`InteractionKind`], the invoking user, the raw
//! option values and a [`ReplyHook`](crate::gateway::ReplyHook) through
//! which every outbound payload for this interaction travels.

use std::fmt;
use std::sync::Arc;

use crate::gateway::ReplyHook;

// =============================================================================
// Platform entity references
// =============================================================================

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
}

impl UserRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A channel reference as resolved by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
}

/// A role reference as resolved by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: u64,
    pub name: String,
}

/// Either a user or a role; the target of a mentionable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mentionable {
    User(UserRef),
    Role(RoleRef),
}

/// An uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: u64,
    pub filename: String,
    pub url: String,
}

/// The message a message context command was invoked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub id: u64,
    pub content: String,
}

// =============================================================================
// Raw option values
// =============================================================================

/// A raw per-option value exactly as the platform delivered it, before type
/// adaptation.
#[derive(Debug, Clone)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(UserRef),
    Channel(ChannelRef),
    Role(RoleRef),
    Mentionable(Mentionable),
    Attachment(AttachmentRef),
}

impl OptionValue {
    /// Short name of the contained value's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            OptionValue::String(_) => "string",
            OptionValue::Integer(_) => "integer",
            OptionValue::Number(_) => "number",
            OptionValue::Boolean(_) => "boolean",
            OptionValue::User(_) => "user",
            OptionValue::Channel(_) => "channel",
            OptionValue::Role(_) => "role",
            OptionValue::Mentionable(_) => "mentionable",
            OptionValue::Attachment(_) => "attachment",
        }
    }
}

/// One named option as supplied by the user.
#[derive(Debug, Clone)]
pub struct OptionInput {
    pub name: String,
    pub value: OptionValue,
}

impl OptionInput {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One submitted modal field.
#[derive(Debug, Clone)]
pub struct FieldInput {
    pub name: String,
    pub value: String,
}

/// The target of a context command.
#[derive(Debug, Clone)]
pub enum ContextTarget {
    User(UserRef),
    Message(MessageInput),
}

// =============================================================================
// Interaction events
// =============================================================================

/// Classification of an inbound interaction, together with its kind-specific
/// payload. The set is closed: the supervisor's routing and the runtime's
/// per-kind dispatch both match exhaustively on it.
#[derive(Debug, Clone)]
pub enum InteractionKind {
    SlashCommand {
        /// Full command name, e.g. `greet` or `settings privacy`.
        command: String,
        options: Vec<OptionInput>,
    },
    ContextCommand {
        command: String,
        target: ContextTarget,
    },
    Autocomplete {
        command: String,
        /// Name of the currently focused option.
        focused: String,
        options: Vec<OptionInput>,
    },
    Component {
        custom_id: String,
        /// Selected values; empty for buttons.
        values: Vec<OptionValue>,
    },
    Modal {
        custom_id: String,
        fields: Vec<FieldInput>,
    },
}

impl InteractionKind {
    /// Human-readable kind name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionKind::SlashCommand { .. } => "slash command",
            InteractionKind::ContextCommand { .. } => "context command",
            InteractionKind::Autocomplete { .. } => "autocomplete",
            InteractionKind::Component { .. } => "component",
            InteractionKind::Modal { .. } => "modal",
        }
    }

    /// Top-level interactions start a new runtime; components and modals
    /// are routed to an existing one through their custom id.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            InteractionKind::SlashCommand { .. }
                | InteractionKind::ContextCommand { .. }
                | InteractionKind::Autocomplete { .. }
        )
    }
}

/// A single inbound interaction.
#[derive(Clone)]
pub struct InteractionEvent {
    kind: InteractionKind,
    user: UserRef,
    guild_id: Option<u64>,
    channel_id: Option<u64>,
    raw: Option<Arc<serde_json::Value>>,
    hook: Arc<dyn ReplyHook>,
}

impl InteractionEvent {
    pub fn new(kind: InteractionKind, user: UserRef, hook: Arc<dyn ReplyHook>) -> Self {
        Self {
            kind,
            user,
            guild_id: None,
            channel_id: None,
            raw: None,
            hook,
        }
    }

    /// Attaches the guild the interaction happened in.
    pub fn with_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// Attaches the channel the interaction happened in.
    pub fn with_channel(mut self, channel_id: u64) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    /// Attaches the raw platform payload for adapter-specific access.
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(Arc::new(raw));
        self
    }

    pub fn kind(&self) -> &InteractionKind {
        &self.kind
    }

    pub fn user(&self) -> &UserRef {
        &self.user
    }

    pub fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.channel_id
    }

    /// Raw platform payload, if the adapter preserved it.
    pub fn raw(&self) -> Option<&serde_json::Value> {
        self.raw.as_deref()
    }

    /// The reply hook all outbound payloads for this interaction go through.
    pub fn hook(&self) -> &Arc<dyn ReplyHook> {
        &self.hook
    }

    /// Looks up a named option on command and autocomplete interactions.
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        let options = match &self.kind {
            InteractionKind::SlashCommand { options, .. } => options,
            InteractionKind::Autocomplete { options, .. } => options,
            _ => return None,
        };
        options
            .iter()
            .find(|option| option.name == name)
            .map(|option| &option.value)
    }

    /// The custom id carried by component and modal interactions.
    pub fn custom_id(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::Component { custom_id, .. } => Some(custom_id),
            InteractionKind::Modal { custom_id, .. } => Some(custom_id),
            _ => None,
        }
    }
}

impl fmt::Debug for InteractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionEvent")
            .field("kind", &self.kind.name())
            .field("user", &self.user)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}
