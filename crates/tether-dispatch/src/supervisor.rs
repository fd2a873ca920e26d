//! The dispatch supervisor.
//!
//! The supervisor is the single entry point for inbound interaction
//! events. It classifies each event, resolves or creates the target
//! [`Runtime`], and enqueues the event — never blocking and never running
//! handler code on the delivery thread.
//!
//! Routing rules:
//! - top-level interactions (commands, autocomplete) always start a fresh
//!   runtime;
//! - components and modals are traced back to their runtime through the
//!   custom id embedded in the component; ids without the framework prefix
//!   belong to someone else and are ignored;
//! - independent components run on a throwaway runtime that is never
//!   registered and closes once its queue drains;
//! - a bound id whose runtime is gone produces the user-visible
//!   unknown-interaction reply, never a silent drop.
//!
//! [`Supervisor::start`] is the sole creation path; owning the returned
//! handle is owning the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use tether_core::custom_id::{CustomId, Scope};
use tether_core::event::InteractionEvent;
use tether_core::gateway::EventSink;
use tether_core::interactions::InteractionDefinition;
use tether_core::registry::InteractionRegistry;

use crate::adapt::TypeAdapters;
use crate::config::{DispatchConfig, ExpirationStrategy};
use crate::handling::Engine;
use crate::messages::{DefaultErrorMessages, ErrorMessageFactory};
use crate::middleware::{
    AllowAllPermissions, CooldownStore, InMemoryCooldowns, Middleware, Middlewares,
    PermissionsProvider, Priority,
};
use crate::reply::bare_payload;
use crate::runtime::Runtime;

struct SupervisorInner {
    engine: Arc<Engine>,
    runtimes: Mutex<HashMap<String, Runtime>>,
}

/// Handle to a started dispatcher.
///
/// Cloning is cheap; all clones drive the same runtime registry. Dropping
/// the last handle closes every runtime.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<SupervisorInner>,
}

impl Supervisor {
    /// Starts configuring a supervisor.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// An [`EventSink`] platform adapters push events into.
    pub fn sink(&self) -> EventSink {
        let supervisor = self.clone();
        EventSink::new(move |event| supervisor.on_event(event))
    }

    /// Number of currently registered runtimes.
    pub fn runtime_count(&self) -> usize {
        self.inner.runtimes.lock().len()
    }

    /// Closes every runtime. Subsequent events produce unknown-interaction
    /// replies (components) or fresh runtimes (commands).
    pub fn shutdown(&self) {
        let mut runtimes = self.inner.runtimes.lock();
        info!(count = runtimes.len(), "Shutting down supervisor");
        for runtime in runtimes.values() {
            runtime.close();
        }
        runtimes.clear();
    }

    /// Routes one inbound event. Only classifies and enqueues; returns
    /// immediately.
    ///
    /// Must be called from within a Tokio runtime, since resolving the
    /// event may spawn a worker task.
    pub fn on_event(&self, event: InteractionEvent) {
        self.sweep();

        if event.kind().is_top_level() {
            let runtime = self.create_runtime();
            debug!(
                runtime = %runtime.id(),
                event = event.kind().name(),
                "Created new runtime for top-level interaction"
            );
            runtime.enqueue(event);
            return;
        }

        // every non-top-level kind carries a custom id
        let Some(raw_id) = event.custom_id().map(str::to_owned) else {
            return;
        };

        if CustomId::is_foreign(&raw_id) {
            debug!(custom_id = %raw_id, "Ignoring component with foreign custom id");
            return;
        }

        let custom_id = match CustomId::parse(&raw_id) {
            Ok(custom_id) => custom_id,
            Err(parse_error) => {
                warn!(custom_id = %raw_id, error = %parse_error, "Malformed custom id");
                return;
            }
        };

        match custom_id.scope() {
            Scope::Independent => {
                // throwaway context: runs the handler as if runtime-bound,
                // but is never stored and never expires
                let runtime =
                    Runtime::spawn(Arc::clone(&self.inner.engine), ExpirationStrategy::Never);
                debug!(
                    runtime = %runtime.id(),
                    id = %custom_id.definition_id(),
                    "Running independent component on throwaway runtime"
                );
                runtime.enqueue(event);
                runtime.seal();
            }
            Scope::Bound(token) => {
                let runtime = self.inner.runtimes.lock().get(token).cloned();
                match runtime {
                    Some(runtime) if runtime.enqueue(event.clone()) => {
                        debug!(runtime = %runtime.id(), "Routed event to existing runtime");
                    }
                    _ => {
                        debug!(runtime = %token, "No runtime for bound custom id");
                        self.reply_unknown(event);
                    }
                }
            }
        }
    }

    fn create_runtime(&self) -> Runtime {
        let runtime = Runtime::spawn(
            Arc::clone(&self.inner.engine),
            self.inner.engine.config.expiration(),
        );
        self.inner
            .runtimes
            .lock()
            .insert(runtime.id().to_string(), runtime.clone());
        runtime
    }

    /// Drops runtimes that expired or were closed.
    fn sweep(&self) {
        self.inner
            .runtimes
            .lock()
            .retain(|_, runtime| !runtime.is_closed());
    }

    /// Sends the unknown-interaction reply off the delivery thread.
    fn reply_unknown(&self, event: InteractionEvent) {
        let payload = bare_payload(&self.inner.engine.messages.unknown_interaction(), true);
        tokio::spawn(async move {
            if let Err(gateway_error) = event.hook().send(payload).await {
                error!(error = %gateway_error, "Failed to send unknown-interaction reply");
            }
        });
    }
}

impl Drop for SupervisorInner {
    fn drop(&mut self) {
        for runtime in self.runtimes.lock().values() {
            runtime.close();
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("runtimes", &self.runtime_count())
            .finish()
    }
}

// =============================================================================
// SupervisorBuilder
// =============================================================================

/// Builder wiring the definition registry, adapters, middlewares and
/// providers into a started [`Supervisor`].
pub struct SupervisorBuilder {
    registry: Arc<InteractionRegistry>,
    adapters: TypeAdapters,
    permissions: Arc<dyn PermissionsProvider>,
    cooldowns: Arc<dyn CooldownStore>,
    messages: Arc<dyn ErrorMessageFactory>,
    middlewares: Vec<(Priority, Arc<dyn Middleware>)>,
    config: DispatchConfig,
}

impl SupervisorBuilder {
    fn new() -> Self {
        Self {
            registry: Arc::new(InteractionRegistry::builder().build()),
            adapters: TypeAdapters::with_defaults(),
            permissions: Arc::new(AllowAllPermissions),
            cooldowns: Arc::new(InMemoryCooldowns::new()),
            messages: Arc::new(DefaultErrorMessages),
            middlewares: Vec::new(),
            config: DispatchConfig::default(),
        }
    }

    /// Sets the definition registry.
    pub fn registry(mut self, registry: InteractionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replaces the type adapter registry.
    pub fn adapters(mut self, adapters: TypeAdapters) -> Self {
        self.adapters = adapters;
        self
    }

    /// Sets the permissions provider consulted by the built-in permission
    /// middleware.
    pub fn permissions(mut self, provider: Arc<dyn PermissionsProvider>) -> Self {
        self.permissions = provider;
        self
    }

    /// Sets the cooldown store consulted by the built-in cooldown
    /// middleware.
    pub fn cooldowns(mut self, store: Arc<dyn CooldownStore>) -> Self {
        self.cooldowns = store;
        self
    }

    /// Sets the error-message factory.
    pub fn messages(mut self, messages: Arc<dyn ErrorMessageFactory>) -> Self {
        self.messages = messages;
        self
    }

    /// Splices a custom middleware into the chain at the given priority.
    pub fn middleware(mut self, priority: Priority, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push((priority, middleware));
        self
    }

    /// Sets the dispatch configuration.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine and starts the supervisor.
    pub fn start(self) -> Supervisor {
        vet_registry(&self.registry, &self.adapters);

        let mut middlewares =
            Middlewares::with_defaults(self.permissions, self.cooldowns, Arc::clone(&self.messages));
        for (priority, middleware) in self.middlewares {
            middlewares.register(priority, middleware);
        }

        let engine = Arc::new(Engine {
            registry: self.registry,
            adapters: self.adapters,
            middlewares,
            messages: self.messages,
            config: self.config,
        });

        info!(
            definitions = engine.registry.len(),
            middlewares = engine.middlewares.len(),
            "Supervisor started"
        );

        Supervisor {
            inner: Arc::new(SupervisorInner {
                engine,
                runtimes: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Startup configuration check: every declared option kind must have an
/// adapter. Affected commands stay registered but fail at dispatch time,
/// so the misconfiguration is loud in the logs.
fn vet_registry(registry: &InteractionRegistry, adapters: &TypeAdapters) {
    for definition in registry.iter() {
        if let InteractionDefinition::SlashCommand(command) = &**definition {
            for option in &command.options {
                if !adapters.supports(option.kind) {
                    error!(
                        command = %command.command,
                        option = %option.name,
                        kind = %option.kind,
                        "No type adapter registered for declared option kind; \
                         the command will fail at dispatch time"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use tether_core::custom_id::CustomId;
    use tether_core::definition::{DefinitionId, OptionDescriptor, OptionKind};
    use tether_core::event::{
        InteractionKind, OptionInput, OptionValue, UserRef,
    };
    use tether_core::interactions::{
        AutocompleteDefinition, ButtonDefinition, ModalDefinition, SlashCommandDefinition,
        TextField,
    };
    use tether_core::reply::{Choice, Component, ComponentRef, Reply};

    use crate::context::InvocationContext;
    use crate::testing::{RecordingHook, wait_until};

    const GHOST_TOKEN: &str = "00000000000000000000000000000000";

    fn user() -> UserRef {
        UserRef::new(42, "ada")
    }

    fn slash_event(
        command: &str,
        options: Vec<OptionInput>,
        hook: Arc<RecordingHook>,
    ) -> InteractionEvent {
        InteractionEvent::new(
            InteractionKind::SlashCommand {
                command: command.into(),
                options,
            },
            user(),
            hook,
        )
    }

    fn component_event(custom_id: &str, hook: Arc<RecordingHook>) -> InteractionEvent {
        InteractionEvent::new(
            InteractionKind::Component {
                custom_id: custom_id.into(),
                values: Vec::new(),
            },
            user(),
            hook,
        )
    }

    /// Controller with per-conversation state: counts how often any of its
    /// handlers ran on the same runtime.
    #[derive(Default)]
    struct GreetCmd {
        invocations: AtomicUsize,
    }

    fn greet_registry() -> InteractionRegistry {
        InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<GreetCmd>("greet")
                    .command("greet")
                    .option(OptionDescriptor::required("name", OptionKind::String))
                    .handler(|cmd, inv| async move {
                        let count = cmd.invocations.fetch_add(1, Ordering::SeqCst) + 1;
                        let name = inv.arg(0).as_str().unwrap_or("stranger").to_string();
                        inv.kv.put("name", name.clone());
                        assert_eq!(count, 1);
                        Reply::new(format!("Hello, {name}!"))
                            .component(ComponentRef::of::<GreetCmd>("again"))
                    }),
            )
            .register(
                ButtonDefinition::builder::<GreetCmd>("again")
                    .label("Greet again")
                    .handler(|cmd, inv| async move {
                        let count = cmd.invocations.fetch_add(1, Ordering::SeqCst) + 1;
                        let name: String = inv.kv.get("name").unwrap_or_default();
                        format!("Hello again, {name}! ({count})")
                    }),
            )
            .build()
    }

    #[tokio::test]
    async fn greet_scenario_reuses_instance_and_edits_in_place() {
        let supervisor = Supervisor::builder().registry(greet_registry()).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event(
            "greet",
            vec![OptionInput::new("name", OptionValue::String("Ada".into()))],
            hook.clone(),
        ));

        wait_until(|| hook.sent_count() == 1).await;
        let first = hook.last_sent().unwrap();
        assert_eq!(first.content, "Hello, Ada!");
        assert_eq!(supervisor.runtime_count(), 1);

        // the button is stamped with the runtime's scope
        let components = first.components.clone().unwrap();
        let Component::Button { custom_id, .. } = &components[0] else {
            panic!("expected a button");
        };
        let parsed = CustomId::parse(custom_id).unwrap();
        assert!(!parsed.is_independent());

        // clicking the button routes back to the same runtime and, per the
        // default reply config, edits the previous reply in place
        supervisor.on_event(component_event(custom_id, hook.clone()));
        wait_until(|| hook.edit_count() == 1).await;
        let (_, edited) = hook.last_edit().unwrap();
        assert_eq!(edited.content, "Hello again, Ada! (2)");
        assert_eq!(supervisor.runtime_count(), 1);
    }

    #[tokio::test]
    async fn unknown_runtime_produces_unknown_interaction_reply() {
        let supervisor = Supervisor::builder().registry(greet_registry()).start();
        let hook = Arc::new(RecordingHook::new());

        let custom_id = CustomId::bound(GHOST_TOKEN, DefinitionId::new("GreetCmd", "again"))
            .unwrap()
            .to_string();
        supervisor.on_event(component_event(&custom_id, hook.clone()));

        wait_until(|| hook.sent_count() == 1).await;
        let reply = hook.last_sent().unwrap();
        assert!(reply.content.contains("no longer available"), "{reply:?}");
        assert!(reply.ephemeral);
        assert_eq!(supervisor.runtime_count(), 0);
    }

    #[tokio::test]
    async fn closed_runtime_produces_unknown_interaction_reply() {
        let supervisor = Supervisor::builder().registry(greet_registry()).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event(
            "greet",
            vec![OptionInput::new("name", OptionValue::String("Ada".into()))],
            hook.clone(),
        ));
        wait_until(|| hook.sent_count() == 1).await;

        let components = hook.last_sent().unwrap().components.unwrap();
        let custom_id = components[0].custom_id().to_string();

        // close the conversation, then click the now-stale button
        supervisor.shutdown();
        supervisor.on_event(component_event(&custom_id, hook.clone()));

        wait_until(|| hook.sent_count() == 2).await;
        assert!(
            hook.last_sent()
                .unwrap()
                .content
                .contains("no longer available")
        );
    }

    #[tokio::test]
    async fn foreign_custom_ids_are_ignored() {
        let supervisor = Supervisor::builder().registry(greet_registry()).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(component_event("help-button", hook.clone()));
        supervisor.on_event(component_event("other.app.button", hook.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hook.sent_count(), 0);
        assert_eq!(supervisor.runtime_count(), 0);
    }

    #[tokio::test]
    async fn independent_component_runs_without_any_runtime_entry() {
        // simulates a process restart: nothing but the registry survives
        let supervisor = Supervisor::builder().registry(greet_registry()).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(component_event("jdac.static.GreetCmd.again", hook.clone()));

        wait_until(|| hook.edit_count() + hook.sent_count() == 1).await;
        assert_eq!(supervisor.runtime_count(), 0);
    }

    #[tokio::test]
    async fn two_runtimes_do_not_block_each_other() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let gate_for_handler = Arc::clone(&gate);

        #[derive(Default)]
        struct SlowCmd;
        #[derive(Default)]
        struct FastCmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<SlowCmd>("slow")
                    .command("slow")
                    .handler(move |_cmd, _inv| {
                        let gate = Arc::clone(&gate_for_handler);
                        async move {
                            gate.notified().await;
                            "slow done"
                        }
                    }),
            )
            .register(
                SlashCommandDefinition::builder::<FastCmd>("fast")
                    .command("fast")
                    .handler(|_cmd, _inv| async move { "fast done" }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("slow", Vec::new(), hook.clone()));
        supervisor.on_event(slash_event("fast", Vec::new(), hook.clone()));

        // the fast runtime completes while the slow one is still parked
        wait_until(|| hook.sent_count() == 1).await;
        assert_eq!(hook.last_sent().unwrap().content, "fast done");

        gate.notify_one();
        wait_until(|| hook.sent_count() == 2).await;
    }

    struct Rejecting;

    #[async_trait]
    impl Middleware for Rejecting {
        async fn call(&self, ctx: &mut InvocationContext) {
            ctx.cancel(Reply::new("blocked").ephemeral(true).edit(false));
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    struct Recording {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Middleware for Recording {
        async fn call(&self, _ctx: &mut InvocationContext) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn cancellation_skips_handler_and_later_middlewares() {
        let handler_calls = Arc::new(AtomicUsize::new(0));
        let later_calls = Arc::new(AtomicUsize::new(0));

        #[derive(Default)]
        struct Cmd;

        let handler_calls_in = Arc::clone(&handler_calls);
        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Cmd>("ping")
                    .command("ping")
                    .handler(move |_cmd, _inv| {
                        let calls = Arc::clone(&handler_calls_in);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            "pong"
                        }
                    }),
            )
            .build();

        let supervisor = Supervisor::builder()
            .registry(registry)
            .middleware(Priority::High, Arc::new(Rejecting))
            .middleware(
                Priority::Low,
                Arc::new(Recording {
                    calls: Arc::clone(&later_calls),
                }),
            )
            .start();

        let hook = Arc::new(RecordingHook::new());
        supervisor.on_event(slash_event("ping", Vec::new(), hook.clone()));

        wait_until(|| hook.sent_count() == 1).await;
        assert_eq!(hook.last_sent().unwrap().content, "blocked");
        // exactly one reply, the cancellation one
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hook.sent_count() + hook.edit_count(), 1);
        assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_handler_yields_one_reply_and_keeps_the_runtime_alive() {
        #[derive(Default)]
        struct Flaky;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Flaky>("fail")
                    .command("fail")
                    .handler(|_cmd, _inv| async move {
                        let result: Result<Reply, tether_core::error::BoxError> =
                            Err("database exploded".into());
                        result
                    }),
            )
            .register(
                ButtonDefinition::builder::<Flaky>("retry")
                    .label("Retry")
                    .handler(|_cmd, _inv| async move {
                        Reply::new("recovered").edit(false)
                    }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("fail", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 1).await;
        assert!(hook.last_sent().unwrap().content.contains("went wrong"));

        // the runtime survives: a bound component still dispatches on it
        assert_eq!(supervisor.runtime_count(), 1);
        let token = supervisor
            .inner
            .runtimes
            .lock()
            .keys()
            .next()
            .unwrap()
            .clone();
        let custom_id = CustomId::bound(token, DefinitionId::new("Flaky", "retry"))
            .unwrap()
            .to_string();
        supervisor.on_event(component_event(&custom_id, hook.clone()));

        wait_until(|| hook.sent_count() == 2).await;
        assert_eq!(hook.last_sent().unwrap().content, "recovered");
    }

    #[tokio::test]
    async fn panicking_handler_terminates_only_its_own_event() {
        #[derive(Default)]
        struct Crashy;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Crashy>("crash")
                    .command("crash")
                    .handler(|_cmd, inv| async move {
                        if inv.args.is_empty() {
                            panic!("handler bug");
                        }
                    }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("crash", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 1).await;
        assert!(hook.last_sent().unwrap().content.contains("went wrong"));
        // the worker survived the panic
        assert_eq!(supervisor.runtime_count(), 1);
    }

    #[tokio::test]
    async fn cooldown_cancels_the_second_invocation() {
        #[derive(Default)]
        struct Cmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Cmd>("dig")
                    .command("dig")
                    .cooldown(Duration::from_secs(60))
                    .handler(|_cmd, _inv| async move { "dug" }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("dig", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 1).await;
        assert_eq!(hook.last_sent().unwrap().content, "dug");

        supervisor.on_event(slash_event("dig", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 2).await;
        assert!(hook.last_sent().unwrap().content.contains("cooldown"));
    }

    #[tokio::test]
    async fn autocomplete_replies_with_choices() {
        #[derive(Default)]
        struct TagCmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<TagCmd>("tag")
                    .command("tag")
                    .option(OptionDescriptor::required("name", OptionKind::String))
                    .handler(|_cmd, _inv| async move {}),
            )
            .register(
                AutocompleteDefinition::builder::<TagCmd>("complete_tag")
                    .command("tag")
                    .handler(|_cmd, inv| async move {
                        let current = inv.arg(1).as_str().unwrap_or_default().to_string();
                        Ok(vec![Choice::new(format!("{current}-suggestion"), "1")])
                    }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(InteractionEvent::new(
            InteractionKind::Autocomplete {
                command: "tag".into(),
                focused: "name".into(),
                options: vec![OptionInput::new("name", OptionValue::String("fo".into()))],
            },
            user(),
            hook.clone(),
        ));

        wait_until(|| hook.last_choices().is_some()).await;
        let choices = hook.last_choices().unwrap();
        assert_eq!(choices[0].name, "fo-suggestion");
    }

    #[tokio::test]
    async fn modal_fields_arrive_in_declared_order() {
        #[derive(Default)]
        struct FormCtrl;

        let registry = InteractionRegistry::builder()
            .register(
                ModalDefinition::builder::<FormCtrl>("feedback")
                    .title("Feedback")
                    .field(TextField::short("subject", "Subject"))
                    .field(TextField::paragraph("body", "Body").optional())
                    .handler(|_cmd, inv| async move {
                        let subject = inv.arg(0).as_str().unwrap_or_default();
                        let body = inv.arg(1).as_str().unwrap_or("(empty)");
                        format!("{subject}: {body}")
                    }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        // fields submitted in reverse order still map by declared order
        supervisor.on_event(InteractionEvent::new(
            InteractionKind::Modal {
                custom_id: "jdac.static.FormCtrl.feedback".into(),
                fields: vec![
                    tether_core::event::FieldInput {
                        name: "body".into(),
                        value: "all good".into(),
                    },
                    tether_core::event::FieldInput {
                        name: "subject".into(),
                        value: "praise".into(),
                    },
                ],
            },
            user(),
            hook.clone(),
        ));

        wait_until(|| hook.sent_count() == 1).await;
        assert_eq!(hook.last_sent().unwrap().content, "praise: all good");
    }

    struct DenyAll;

    #[async_trait]
    impl PermissionsProvider for DenyAll {
        async fn has_permissions(
            &self,
            _user: &UserRef,
            _permissions: &[String],
            _event: &InteractionEvent,
        ) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn missing_permissions_cancel_the_invocation() {
        #[derive(Default)]
        struct Cmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Cmd>("admin")
                    .command("admin")
                    .permission("admin")
                    .handler(|_cmd, _inv| async move { "secret" }),
            )
            .build();

        let supervisor = Supervisor::builder()
            .registry(registry)
            .permissions(Arc::new(DenyAll))
            .start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("admin", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 1).await;
        assert!(hook.last_sent().unwrap().content.contains("permissions"));
    }

    #[tokio::test]
    async fn absent_optional_integer_reaches_the_handler_as_sentinel() {
        #[derive(Default)]
        struct Cmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Cmd>("roll")
                    .command("roll")
                    .option(OptionDescriptor::optional("sides", OptionKind::Integer))
                    .handler(|_cmd, inv| async move {
                        match inv.arg(0).as_int() {
                            Some(sides) => format!("rolling d{sides}"),
                            None => "rolling d6".to_string(),
                        }
                    }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event("roll", Vec::new(), hook.clone()));
        wait_until(|| hook.sent_count() == 1).await;
        assert_eq!(hook.last_sent().unwrap().content, "rolling d6");
    }

    #[tokio::test]
    async fn type_adapting_failure_produces_a_descriptive_reply() {
        #[derive(Default)]
        struct Cmd;

        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<Cmd>("pay")
                    .command("pay")
                    .option(OptionDescriptor::required("amount", OptionKind::Integer))
                    .handler(|_cmd, _inv| async move { "paid" }),
            )
            .build();

        let supervisor = Supervisor::builder().registry(registry).start();
        let hook = Arc::new(RecordingHook::new());

        supervisor.on_event(slash_event(
            "pay",
            vec![OptionInput::new(
                "amount",
                OptionValue::String("a lot".into()),
            )],
            hook.clone(),
        ));

        wait_until(|| hook.sent_count() == 1).await;
        let reply = hook.last_sent().unwrap();
        assert!(reply.content.contains("integer"), "{reply:?}");
        assert!(reply.ephemeral);
    }
}
