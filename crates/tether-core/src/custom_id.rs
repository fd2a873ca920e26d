//! The custom-id codec.
//!
//! Every interactive component Tether sends carries a platform-visible id of
//! the form `jdac.<scope>.<definitionId>`. The scope is either the owning
//! runtime's token or the literal `static` for independent components, and
//! the definition id names the handler method to invoke. Decoding an
//! incoming component id therefore recovers everything needed to route the
//! interaction: the conversation it belongs to and the method that handles it.
//!
//! The platform caps component ids at roughly 100 characters, so the format
//! stays compact: a fixed 5-byte prefix, a 32-char runtime token and the
//! `Controller.method` pair.
//!
//! Ids sent by other applications (or plain user-chosen ids) simply don't
//! start with the namespace prefix; [`CustomId::is_foreign`] lets the
//! dispatcher ignore them without ever treating them as an error.

use std::fmt;

use crate::definition::DefinitionId;
use crate::error::CustomIdError;

/// Namespace marker stamped on every component custom id.
pub const NAMESPACE: &str = "jdac";

/// Scope literal used for components that are not bound to any runtime.
pub const INDEPENDENT: &str = "static";

/// Length of a runtime token in characters (lowercase hex).
pub const RUNTIME_TOKEN_LEN: usize = 32;

/// The scope component of a [`CustomId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Bound to the runtime with the contained token.
    Bound(String),
    /// Independent of any runtime; never expires.
    Independent,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Bound(token) => f.write_str(token),
            Scope::Independent => f.write_str(INDEPENDENT),
        }
    }
}

/// A decoded component custom id.
///
/// The string form round-trips losslessly:
/// `CustomId::parse(&id.to_string())` always reproduces `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomId {
    scope: Scope,
    definition: DefinitionId,
}

impl CustomId {
    /// Creates a custom id bound to the given runtime token.
    pub fn bound(
        runtime_id: impl Into<String>,
        definition: DefinitionId,
    ) -> Result<Self, CustomIdError> {
        let token = runtime_id.into();
        if !is_valid_token(&token) {
            return Err(CustomIdError::InvalidRuntimeToken(token));
        }
        Ok(Self {
            scope: Scope::Bound(token),
            definition,
        })
    }

    /// Creates a runtime-independent custom id.
    pub fn independent(definition: DefinitionId) -> Self {
        Self {
            scope: Scope::Independent,
            definition,
        }
    }

    /// Returns `true` if the raw id does not carry the namespace prefix and
    /// therefore belongs to some other application.
    pub fn is_foreign(raw: &str) -> bool {
        raw.split('.').next() != Some(NAMESPACE)
    }

    /// Parses the string form of a custom id.
    ///
    /// Fails with a format error when the segment count or the shape of a
    /// segment does not match; it never returns partially populated data.
    pub fn parse(raw: &str) -> Result<Self, CustomIdError> {
        let mut parts = raw.splitn(3, '.');
        let (namespace, scope, definition) = match (parts.next(), parts.next(), parts.next()) {
            (Some(ns), Some(scope), Some(definition)) => (ns, scope, definition),
            _ => return Err(CustomIdError::Malformed(raw.to_string())),
        };

        if namespace != NAMESPACE {
            return Err(CustomIdError::Malformed(raw.to_string()));
        }

        let scope = if scope == INDEPENDENT {
            Scope::Independent
        } else if is_valid_token(scope) {
            Scope::Bound(scope.to_string())
        } else {
            return Err(CustomIdError::InvalidRuntimeToken(scope.to_string()));
        };

        Ok(Self {
            scope,
            definition: DefinitionId::parse(definition)?,
        })
    }

    /// Returns the scope of this custom id.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the runtime token, or `None` for independent ids.
    pub fn runtime_id(&self) -> Option<&str> {
        match &self.scope {
            Scope::Bound(token) => Some(token),
            Scope::Independent => None,
        }
    }

    /// Returns `true` if this custom id is not bound to any runtime.
    pub fn is_independent(&self) -> bool {
        matches!(self.scope, Scope::Independent)
    }

    /// Returns the definition id this custom id routes to.
    pub fn definition_id(&self) -> &DefinitionId {
        &self.definition
    }
}

impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NAMESPACE}.{}.{}", self.scope, self.definition)
    }
}

/// A runtime token is exactly [`RUNTIME_TOKEN_LEN`] lowercase hex characters.
fn is_valid_token(token: &str) -> bool {
    token.len() == RUNTIME_TOKEN_LEN
        && token
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn definition() -> DefinitionId {
        DefinitionId::new("GreetCmd", "on_button")
    }

    #[test]
    fn bound_round_trip() {
        let id = CustomId::bound(TOKEN, definition()).unwrap();
        let parsed = CustomId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.runtime_id(), Some(TOKEN));
        assert_eq!(parsed.definition_id().as_str(), "GreetCmd.on_button");
    }

    #[test]
    fn independent_round_trip() {
        let id = CustomId::independent(definition());
        assert_eq!(id.to_string(), "jdac.static.GreetCmd.on_button");
        let parsed = CustomId::parse(&id.to_string()).unwrap();
        assert!(parsed.is_independent());
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_bad_token_on_construction() {
        assert!(matches!(
            CustomId::bound("not-a-token", definition()),
            Err(CustomIdError::InvalidRuntimeToken(_))
        ));
    }

    #[test]
    fn malformed_inputs_are_format_errors() {
        for raw in [
            "",
            "jdac",
            "jdac.",
            "jdac.static",
            "jdac.static.GreetCmd",
            "jdac.static.GreetCmd.on.button",
            "jdac.UPPERCASE0123456789abcdef012345.GreetCmd.on_button",
        ] {
            assert!(CustomId::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn foreign_ids_are_not_ours() {
        assert!(CustomId::is_foreign("some-user-chosen-id"));
        assert!(CustomId::is_foreign("other.app.id"));
        assert!(!CustomId::is_foreign("jdac.static.GreetCmd.on_button"));
        // prefixed but broken is still ours, just malformed
        assert!(!CustomId::is_foreign("jdac.broken"));
        assert!(CustomId::parse("jdac.broken").is_err());
    }
}
