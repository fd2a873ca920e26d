//! The interaction definition registry.
//!
//! Holds every parsed definition keyed by its [`DefinitionId`] plus the
//! secondary indices the dispatcher needs: command name to definition for
//! incoming commands and command name to autocomplete handler. The registry
//! is built once at startup and read-only afterwards, so concurrent lookups
//! from runtime workers need no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, warn};

use crate::definition::DefinitionId;
use crate::error::{RegistryError, RegistryResult};
use crate::interactions::{DefinitionKind, InteractionDefinition};

/// Immutable lookup table over all registered interaction definitions.
pub struct InteractionRegistry {
    definitions: HashMap<DefinitionId, Arc<InteractionDefinition>>,
    commands: HashMap<String, DefinitionId>,
    autocompletes: HashMap<String, DefinitionId>,
}

impl InteractionRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            definitions: Vec::new(),
        }
    }

    /// Looks up a definition of the expected kind.
    ///
    /// Distinguishes "nothing registered" from "registered under a
    /// different kind": a modal id used where a button is expected yields
    /// [`RegistryError::KindMismatch`], never a silent fallback.
    pub fn get(
        &self,
        id: &DefinitionId,
        expected: DefinitionKind,
    ) -> RegistryResult<Arc<InteractionDefinition>> {
        let definition = self
            .definitions
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.as_str().to_string()))?;
        if definition.kind() != expected {
            return Err(RegistryError::KindMismatch {
                id: id.as_str().to_string(),
                expected,
                actual: definition.kind(),
            });
        }
        Ok(Arc::clone(definition))
    }

    /// Looks up a definition that may be any message component kind.
    pub fn get_component(&self, id: &DefinitionId) -> RegistryResult<Arc<InteractionDefinition>> {
        let definition = self
            .definitions
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.as_str().to_string()))?;
        if !definition.kind().is_component() {
            return Err(RegistryError::KindMismatch {
                id: id.as_str().to_string(),
                expected: DefinitionKind::Button,
                actual: definition.kind(),
            });
        }
        Ok(Arc::clone(definition))
    }

    /// Looks up the slash or context command registered under `name`.
    pub fn command(&self, name: &str) -> RegistryResult<Arc<InteractionDefinition>> {
        let id = self
            .commands
            .get(name)
            .ok_or_else(|| RegistryError::CommandNotFound(name.to_string()))?;
        Ok(Arc::clone(&self.definitions[id]))
    }

    /// Looks up the autocomplete handler serving command `name`.
    pub fn autocomplete_for(&self, name: &str) -> Option<Arc<InteractionDefinition>> {
        self.autocompletes
            .get(name)
            .map(|id| Arc::clone(&self.definitions[id]))
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` when no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over all registered definitions.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<InteractionDefinition>> {
        self.definitions.values()
    }
}

impl std::fmt::Debug for InteractionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRegistry")
            .field("definitions", &self.definitions.len())
            .field("commands", &self.commands.len())
            .finish()
    }
}

/// Builder collecting definitions before freezing them into a registry.
pub struct RegistryBuilder {
    definitions: Vec<InteractionDefinition>,
}

impl RegistryBuilder {
    /// Adds one definition.
    pub fn register(mut self, definition: InteractionDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Adds many definitions.
    pub fn extend(mut self, definitions: impl IntoIterator<Item = InteractionDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Freezes the collected definitions into an immutable registry.
    ///
    /// Malformed definitions are configuration errors: they are logged and
    /// skipped so the application keeps running with reduced functionality.
    /// An optional primitive-kind command option without a default value
    /// only logs a warning, since the handler will observe the absence
    /// sentinel at invocation time.
    pub fn build(self) -> InteractionRegistry {
        let mut definitions = HashMap::new();
        let mut commands = HashMap::new();
        let mut autocompletes = HashMap::new();

        for definition in self.definitions {
            let id = definition.id().clone();
            if definitions.contains_key(&id) {
                error!(id = %id, "Duplicate definition id, skipping definition");
                continue;
            }

            match &definition {
                InteractionDefinition::SlashCommand(command) => {
                    if commands.contains_key(&command.command) {
                        error!(
                            command = %command.command,
                            "Duplicate command name, skipping definition"
                        );
                        continue;
                    }
                    for option in &command.options {
                        if !option.required && option.kind.is_primitive() && option.default.is_none()
                        {
                            warn!(
                                command = %command.command,
                                option = %option.name,
                                kind = %option.kind,
                                "Optional {} option has no default value; the handler \
                                 will receive the absence sentinel",
                                option.kind
                            );
                        }
                    }
                    commands.insert(command.command.clone(), id.clone());
                }
                InteractionDefinition::ContextCommand(command) => {
                    if commands.contains_key(&command.command) {
                        error!(
                            command = %command.command,
                            "Duplicate command name, skipping definition"
                        );
                        continue;
                    }
                    commands.insert(command.command.clone(), id.clone());
                }
                InteractionDefinition::Autocomplete(autocomplete) => {
                    for command in &autocomplete.commands {
                        if autocompletes.contains_key(command) {
                            error!(
                                command = %command,
                                "Command already has an autocomplete handler, keeping the first"
                            );
                            continue;
                        }
                        autocompletes.insert(command.clone(), id.clone());
                    }
                }
                _ => {}
            }

            definitions.insert(id, Arc::new(definition));
        }

        InteractionRegistry {
            definitions,
            commands,
            autocompletes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::{ButtonDefinition, ModalDefinition, SlashCommandDefinition};

    #[derive(Default)]
    struct GreetCmd;

    fn registry() -> InteractionRegistry {
        InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<GreetCmd>("greet")
                    .command("greet")
                    .handler(|_c, _i| async move {}),
            )
            .register(
                ButtonDefinition::builder::<GreetCmd>("again")
                    .label("Again")
                    .handler(|_c, _i| async move {}),
            )
            .register(
                ModalDefinition::builder::<GreetCmd>("feedback")
                    .title("Feedback")
                    .handler(|_c, _i| async move {}),
            )
            .build()
    }

    #[test]
    fn lookup_by_kind() {
        let registry = registry();
        let id = DefinitionId::new("GreetCmd", "again");
        assert!(registry.get(&id, DefinitionKind::Button).is_ok());
        assert!(registry.get_component(&id).is_ok());
    }

    #[test]
    fn kind_mismatch_is_distinguished_from_not_found() {
        let registry = registry();

        let modal_id = DefinitionId::new("GreetCmd", "feedback");
        match registry.get_component(&modal_id) {
            Err(RegistryError::KindMismatch { actual, .. }) => {
                assert_eq!(actual, DefinitionKind::Modal);
            }
            other => panic!("expected kind mismatch, got {other:?}"),
        }

        let unknown = DefinitionId::new("GreetCmd", "missing");
        assert!(matches!(
            registry.get_component(&unknown),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn command_lookup_by_name() {
        let registry = registry();
        assert!(registry.command("greet").is_ok());
        assert!(matches!(
            registry.command("nope"),
            Err(RegistryError::CommandNotFound(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<GreetCmd>("greet")
                    .command("greet")
                    .handler(|_c, _i| async move {}),
            )
            .register(
                SlashCommandDefinition::builder::<GreetCmd>("greet")
                    .command("other")
                    .handler(|_c, _i| async move {}),
            )
            .build();
        assert_eq!(registry.len(), 1);
        assert!(registry.command("other").is_err());
    }
}
