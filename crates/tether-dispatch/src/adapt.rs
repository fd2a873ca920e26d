//! The type adaptation half of the argument pipeline.
//!
//! Raw platform values arrive as [`OptionValue`]s; declared parameters want
//! [`ArgValue`]s. A [`TypeAdapter`] bridges one declared [`OptionKind`];
//! the [`TypeAdapters`] registry holds one adapter per kind and drives
//! per-option adaptation, including default values for absent optional
//! options (the default string runs through the same adapter as real
//! input).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use tether_core::definition::{ArgValue, OptionDescriptor, OptionKind};
use tether_core::event::{OptionInput, OptionValue};

/// Errors produced during type adaptation.
///
/// Every variant names the expected and the actual shape so the resulting
/// user-facing reply can describe what went wrong.
#[derive(Debug, Clone, Error)]
pub enum AdaptError {
    /// No adapter is registered for the declared kind. This is a
    /// configuration error reported at startup; hitting it at dispatch
    /// time renders the command unusable.
    #[error("no type adapter registered for kind '{kind}'")]
    NoAdapter { kind: OptionKind },

    /// The raw value's shape does not match the declared kind.
    #[error("option '{option}' expected a {expected}, got a {actual}")]
    Shape {
        option: String,
        expected: OptionKind,
        actual: &'static str,
    },

    /// A string value (user input or declared default) failed to parse
    /// into the declared kind.
    #[error("option '{option}' expected a {expected}, could not parse '{value}'")]
    Parse {
        option: String,
        expected: OptionKind,
        value: String,
    },
}

/// Adapts raw platform values of one declared [`OptionKind`].
pub trait TypeAdapter: Send + Sync {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError>;
}

/// Registry mapping declared option kinds to their adapters.
///
/// Built once at startup. [`TypeAdapters::with_defaults`] covers every
/// built-in kind; applications may override individual kinds before the
/// supervisor starts.
pub struct TypeAdapters {
    adapters: HashMap<OptionKind, Arc<dyn TypeAdapter>>,
}

impl TypeAdapters {
    /// An empty registry without any adapters.
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// A registry with the built-in adapter for every [`OptionKind`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(OptionKind::String, StringAdapter);
        registry.register(OptionKind::Integer, IntegerAdapter);
        registry.register(OptionKind::Number, NumberAdapter);
        registry.register(OptionKind::Boolean, BooleanAdapter);
        registry.register(OptionKind::User, UserAdapter);
        registry.register(OptionKind::Channel, ChannelAdapter);
        registry.register(OptionKind::Role, RoleAdapter);
        registry.register(OptionKind::Mentionable, MentionableAdapter);
        registry.register(OptionKind::Attachment, AttachmentAdapter);
        registry
    }

    /// Registers (or replaces) the adapter for a kind.
    pub fn register<A: TypeAdapter + 'static>(&mut self, kind: OptionKind, adapter: A) {
        self.adapters.insert(kind, Arc::new(adapter));
    }

    /// Returns `true` if an adapter for the kind is registered.
    pub fn supports(&self, kind: OptionKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Adapts one declared option against the (possibly absent) raw input.
    pub fn adapt_option(
        &self,
        option: &OptionDescriptor,
        input: Option<&OptionValue>,
    ) -> Result<ArgValue, AdaptError> {
        let adapter = self
            .adapters
            .get(&option.kind)
            .ok_or(AdaptError::NoAdapter { kind: option.kind })?;

        match input {
            Some(raw) => adapter.adapt(raw, option),
            // absent input: the declared default runs through the same
            // adapter, otherwise the handler sees the absence sentinel
            None => match &option.default {
                Some(default) => adapter.adapt(&OptionValue::String(default.clone()), option),
                None => Ok(ArgValue::Absent),
            },
        }
    }

    /// Adapts a full option list in declaration order.
    pub fn adapt_options(
        &self,
        options: &[OptionDescriptor],
        inputs: &[OptionInput],
    ) -> Result<Vec<ArgValue>, AdaptError> {
        options
            .iter()
            .map(|option| {
                let input = inputs
                    .iter()
                    .find(|input| input.name == option.name)
                    .map(|input| &input.value);
                self.adapt_option(option, input)
            })
            .collect()
    }
}

impl Default for TypeAdapters {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for TypeAdapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeAdapters")
            .field("kinds", &self.adapters.len())
            .finish()
    }
}

/// Maps a raw value straight to its argument form, without a declared
/// descriptor. Used for component selections, which carry no option
/// declarations.
pub(crate) fn raw_to_arg(value: &OptionValue) -> ArgValue {
    match value {
        OptionValue::String(value) => ArgValue::String(value.clone()),
        OptionValue::Integer(value) => ArgValue::Int(*value),
        OptionValue::Number(value) => ArgValue::Float(*value),
        OptionValue::Boolean(value) => ArgValue::Bool(*value),
        OptionValue::User(user) => ArgValue::User(user.clone()),
        OptionValue::Channel(channel) => ArgValue::Channel(channel.clone()),
        OptionValue::Role(role) => ArgValue::Role(role.clone()),
        OptionValue::Mentionable(mentionable) => ArgValue::Mentionable(mentionable.clone()),
        OptionValue::Attachment(attachment) => ArgValue::Attachment(attachment.clone()),
    }
}

// =============================================================================
// Built-in adapters
// =============================================================================

struct StringAdapter;

impl TypeAdapter for StringAdapter {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError> {
        let value = match raw {
            OptionValue::String(value) => value.clone(),
            OptionValue::Integer(value) => value.to_string(),
            OptionValue::Number(value) => value.to_string(),
            OptionValue::Boolean(value) => value.to_string(),
            other => {
                return Err(AdaptError::Shape {
                    option: option.name.clone(),
                    expected: OptionKind::String,
                    actual: other.shape(),
                });
            }
        };
        Ok(ArgValue::String(value))
    }
}

struct IntegerAdapter;

impl TypeAdapter for IntegerAdapter {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError> {
        match raw {
            OptionValue::Integer(value) => Ok(ArgValue::Int(*value)),
            OptionValue::String(value) => {
                value
                    .trim()
                    .parse::<i64>()
                    .map(ArgValue::Int)
                    .map_err(|_| AdaptError::Parse {
                        option: option.name.clone(),
                        expected: OptionKind::Integer,
                        value: value.clone(),
                    })
            }
            other => Err(AdaptError::Shape {
                option: option.name.clone(),
                expected: OptionKind::Integer,
                actual: other.shape(),
            }),
        }
    }
}

struct NumberAdapter;

impl TypeAdapter for NumberAdapter {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError> {
        match raw {
            OptionValue::Number(value) => Ok(ArgValue::Float(*value)),
            OptionValue::Integer(value) => Ok(ArgValue::Float(*value as f64)),
            OptionValue::String(value) => {
                value
                    .trim()
                    .parse::<f64>()
                    .map(ArgValue::Float)
                    .map_err(|_| AdaptError::Parse {
                        option: option.name.clone(),
                        expected: OptionKind::Number,
                        value: value.clone(),
                    })
            }
            other => Err(AdaptError::Shape {
                option: option.name.clone(),
                expected: OptionKind::Number,
                actual: other.shape(),
            }),
        }
    }
}

struct BooleanAdapter;

impl TypeAdapter for BooleanAdapter {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError> {
        match raw {
            OptionValue::Boolean(value) => Ok(ArgValue::Bool(*value)),
            OptionValue::String(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(ArgValue::Bool(true)),
                "false" | "no" | "0" => Ok(ArgValue::Bool(false)),
                _ => Err(AdaptError::Parse {
                    option: option.name.clone(),
                    expected: OptionKind::Boolean,
                    value: value.clone(),
                }),
            },
            other => Err(AdaptError::Shape {
                option: option.name.clone(),
                expected: OptionKind::Boolean,
                actual: other.shape(),
            }),
        }
    }
}

macro_rules! entity_adapter {
    ($name:ident, $kind:expr, $variant:ident => $arg:ident) => {
        struct $name;

        impl TypeAdapter for $name {
            fn adapt(
                &self,
                raw: &OptionValue,
                option: &OptionDescriptor,
            ) -> Result<ArgValue, AdaptError> {
                match raw {
                    OptionValue::$variant(value) => Ok(ArgValue::$arg(value.clone())),
                    other => Err(AdaptError::Shape {
                        option: option.name.clone(),
                        expected: $kind,
                        actual: other.shape(),
                    }),
                }
            }
        }
    };
}

entity_adapter!(UserAdapter, OptionKind::User, User => User);
entity_adapter!(ChannelAdapter, OptionKind::Channel, Channel => Channel);
entity_adapter!(RoleAdapter, OptionKind::Role, Role => Role);
entity_adapter!(AttachmentAdapter, OptionKind::Attachment, Attachment => Attachment);

struct MentionableAdapter;

impl TypeAdapter for MentionableAdapter {
    fn adapt(&self, raw: &OptionValue, option: &OptionDescriptor) -> Result<ArgValue, AdaptError> {
        use tether_core::event::Mentionable;
        match raw {
            OptionValue::Mentionable(value) => Ok(ArgValue::Mentionable(value.clone())),
            OptionValue::User(user) => Ok(ArgValue::Mentionable(Mentionable::User(user.clone()))),
            OptionValue::Role(role) => Ok(ArgValue::Mentionable(Mentionable::Role(role.clone()))),
            other => Err(AdaptError::Shape {
                option: option.name.clone(),
                expected: OptionKind::Mentionable,
                actual: other.shape(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(values: Vec<(&str, OptionValue)>) -> Vec<OptionInput> {
        values
            .into_iter()
            .map(|(name, value)| OptionInput::new(name, value))
            .collect()
    }

    #[test]
    fn adapts_matching_shapes() {
        let adapters = TypeAdapters::with_defaults();
        let options = vec![
            OptionDescriptor::required("name", OptionKind::String),
            OptionDescriptor::required("age", OptionKind::Integer),
        ];
        let args = adapters
            .adapt_options(
                &options,
                &inputs(vec![
                    ("name", OptionValue::String("Ada".into())),
                    ("age", OptionValue::Integer(36)),
                ]),
            )
            .unwrap();
        assert_eq!(args[0].as_str(), Some("Ada"));
        assert_eq!(args[1].as_int(), Some(36));
    }

    #[test]
    fn absent_optional_without_default_is_the_sentinel() {
        let adapters = TypeAdapters::with_defaults();
        let options = vec![OptionDescriptor::optional("count", OptionKind::Integer)];
        let args = adapters.adapt_options(&options, &[]).unwrap();
        assert!(args[0].is_absent());
    }

    #[test]
    fn default_value_runs_through_the_adapter() {
        let adapters = TypeAdapters::with_defaults();
        let options = vec![
            OptionDescriptor::optional("count", OptionKind::Integer).default_value("42"),
        ];
        let args = adapters.adapt_options(&options, &[]).unwrap();
        assert_eq!(args[0].as_int(), Some(42));
    }

    #[test]
    fn unparsable_default_is_a_parse_error() {
        let adapters = TypeAdapters::with_defaults();
        let options = vec![
            OptionDescriptor::optional("count", OptionKind::Integer).default_value("lots"),
        ];
        assert!(matches!(
            adapters.adapt_options(&options, &[]),
            Err(AdaptError::Parse { .. })
        ));
    }

    #[test]
    fn shape_mismatch_names_both_shapes() {
        let adapters = TypeAdapters::with_defaults();
        let options = vec![OptionDescriptor::required("who", OptionKind::User)];
        let error = adapters
            .adapt_options(&options, &inputs(vec![("who", OptionValue::Boolean(true))]))
            .unwrap_err();
        let message = error.to_string();
        assert!(message.contains("user"), "{message}");
        assert!(message.contains("boolean"), "{message}");
    }

    #[test]
    fn missing_adapter_is_reported() {
        let adapters = TypeAdapters::empty();
        let options = vec![OptionDescriptor::required("name", OptionKind::String)];
        assert!(matches!(
            adapters.adapt_options(&options, &[]),
            Err(AdaptError::NoAdapter { .. })
        ));
    }
}
