//! Application bootstrap.
//!
//! [`TetherApp`] wires everything together: it loads configuration,
//! initializes logging, freezes the definition registry, starts the
//! dispatch supervisor and drives the registered platform adapters until a
//! shutdown signal arrives.
//!
//! ```rust,ignore
//! use tether_runtime::app::TetherApp;
//!
//! #[tokio::main]
//! async fn main() -> tether_runtime::error::AppResult<()> {
//!     TetherApp::builder()
//!         .definitions(my_definitions())
//!         .platform(Arc::new(MyPlatform::connect()?))
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use tether_core::gateway::{EventSink, Platform};
use tether_core::interactions::InteractionDefinition;
use tether_core::registry::InteractionRegistry;

use tether_dispatch::middleware::{CooldownStore, Middleware, PermissionsProvider, Priority};
use tether_dispatch::{ErrorMessageFactory, Supervisor, TypeAdapters};

use crate::config::{ConfigLoader, TetherConfig};
use crate::error::{AppError, AppResult};
use crate::logging;

/// A configured application: a started supervisor plus the platform
/// adapters feeding it.
pub struct TetherApp {
    config: TetherConfig,
    supervisor: Supervisor,
    platforms: Vec<Arc<dyn Platform>>,
}

impl TetherApp {
    /// Starts building an application.
    pub fn builder() -> TetherAppBuilder {
        TetherAppBuilder::new()
    }

    /// The effective configuration.
    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    /// The running supervisor.
    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// The sink platform adapters push events into. Exposed for embedding
    /// Tether into an existing event loop instead of using [`Self::run`].
    pub fn sink(&self) -> EventSink {
        self.supervisor.sink()
    }

    /// Runs all platform adapters until Ctrl+C or SIGTERM.
    pub async fn run(self) -> AppResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs all platform adapters until the given future completes.
    ///
    /// A platform that failed before shutdown surfaces as
    /// [`AppError::Platform`] after the remaining adapters were stopped.
    pub async fn run_until<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut workers = Vec::new();
        for platform in &self.platforms {
            let platform = Arc::clone(platform);
            let sink = self.supervisor.sink();
            let name = platform.name().to_string();
            info!(platform = %name, "Starting platform adapter");
            workers.push(tokio::spawn(async move {
                platform.start(sink).await.map_err(|error| (name, error))
            }));
        }

        shutdown.await;

        info!("Shutting down");
        self.supervisor.shutdown();

        let mut first_failure = None;
        for worker in workers {
            worker.abort();
            if let Ok(Err((platform, error))) = worker.await {
                error!(platform = %platform, error = %error, "Platform adapter failed");
                first_failure.get_or_insert(AppError::Platform { platform, error });
            }
        }
        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(signal_error) => {
                error!(error = %signal_error, "Failed to register SIGTERM handler");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}

// =============================================================================
// TetherAppBuilder
// =============================================================================

/// Collects definitions, providers and platform adapters, then builds the
/// application.
pub struct TetherAppBuilder {
    config: Option<TetherConfig>,
    definitions: Vec<InteractionDefinition>,
    adapters: Option<TypeAdapters>,
    middlewares: Vec<(Priority, Arc<dyn Middleware>)>,
    permissions: Option<Arc<dyn PermissionsProvider>>,
    cooldowns: Option<Arc<dyn CooldownStore>>,
    messages: Option<Arc<dyn ErrorMessageFactory>>,
    platforms: Vec<Arc<dyn Platform>>,
}

impl TetherAppBuilder {
    fn new() -> Self {
        Self {
            config: None,
            definitions: Vec::new(),
            adapters: None,
            middlewares: Vec::new(),
            permissions: None,
            cooldowns: None,
            messages: None,
            platforms: Vec::new(),
        }
    }

    /// Uses a pre-loaded configuration instead of the default loader.
    pub fn config(mut self, config: TetherConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers one interaction definition.
    pub fn definition(mut self, definition: InteractionDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Registers many interaction definitions.
    pub fn definitions(
        mut self,
        definitions: impl IntoIterator<Item = InteractionDefinition>,
    ) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Replaces the type adapter registry.
    pub fn adapters(mut self, adapters: TypeAdapters) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Splices a custom middleware into the chain.
    pub fn middleware(mut self, priority: Priority, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push((priority, middleware));
        self
    }

    /// Sets the permissions provider.
    pub fn permissions(mut self, provider: Arc<dyn PermissionsProvider>) -> Self {
        self.permissions = Some(provider);
        self
    }

    /// Sets the cooldown store.
    pub fn cooldowns(mut self, store: Arc<dyn CooldownStore>) -> Self {
        self.cooldowns = Some(store);
        self
    }

    /// Sets the error-message factory.
    pub fn messages(mut self, messages: Arc<dyn ErrorMessageFactory>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Adds a platform adapter.
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Loads configuration (unless provided), initializes logging and
    /// starts the supervisor.
    pub fn build(self) -> AppResult<TetherApp> {
        let config = match self.config {
            Some(config) => config,
            None => ConfigLoader::new().load()?,
        };

        logging::init_from_config(&config.logging);

        let registry = InteractionRegistry::builder()
            .extend(self.definitions)
            .build();
        info!(definitions = registry.len(), "Interaction registry frozen");

        let mut builder = Supervisor::builder()
            .registry(registry)
            .config(config.dispatch.clone());
        if let Some(adapters) = self.adapters {
            builder = builder.adapters(adapters);
        }
        if let Some(provider) = self.permissions {
            builder = builder.permissions(provider);
        }
        if let Some(store) = self.cooldowns {
            builder = builder.cooldowns(store);
        }
        if let Some(messages) = self.messages {
            builder = builder.messages(messages);
        }
        for (priority, middleware) in self.middlewares {
            builder = builder.middleware(priority, middleware);
        }

        Ok(TetherApp {
            config,
            supervisor: builder.start(),
            platforms: self.platforms,
        })
    }
}

impl Default for TetherAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use tether_core::error::GatewayResult;
    use tether_core::event::{InteractionEvent, InteractionKind, UserRef};
    use tether_core::gateway::{MessageRef, ReplyHook};
    use tether_core::interactions::SlashCommandDefinition;
    use tether_core::reply::{Choice, OutboundPayload};

    struct CollectingHook {
        sent: Mutex<Vec<OutboundPayload>>,
    }

    #[async_trait]
    impl ReplyHook for CollectingHook {
        async fn defer(&self, _ephemeral: bool) -> GatewayResult<()> {
            Ok(())
        }

        async fn send(&self, payload: OutboundPayload) -> GatewayResult<MessageRef> {
            self.sent.lock().push(payload);
            Ok(MessageRef { id: 1, channel_id: 1 })
        }

        async fn edit(
            &self,
            message: MessageRef,
            _payload: OutboundPayload,
        ) -> GatewayResult<MessageRef> {
            Ok(message)
        }

        async fn autocomplete(&self, _choices: Vec<Choice>) -> GatewayResult<()> {
            Ok(())
        }
    }

    /// Platform that delivers one ping command and returns.
    struct OneShotPlatform {
        hook: Arc<CollectingHook>,
    }

    #[async_trait]
    impl Platform for OneShotPlatform {
        fn name(&self) -> &str {
            "one-shot"
        }

        async fn start(&self, sink: EventSink) -> GatewayResult<()> {
            sink.push(InteractionEvent::new(
                InteractionKind::SlashCommand {
                    command: "ping".into(),
                    options: Vec::new(),
                },
                UserRef::new(1, "ada"),
                Arc::clone(&self.hook) as Arc<dyn ReplyHook>,
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct PingCmd;

    #[tokio::test]
    async fn app_routes_platform_events_through_the_supervisor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);

        let hook = Arc::new(CollectingHook {
            sent: Mutex::new(Vec::new()),
        });

        let app = TetherApp::builder()
            .config(TetherConfig::default())
            .definition(
                SlashCommandDefinition::builder::<PingCmd>("ping")
                    .command("ping")
                    .handler(move |_cmd, _inv| {
                        let calls = Arc::clone(&calls_in);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            "pong"
                        }
                    }),
            )
            .platform(Arc::new(OneShotPlatform {
                hook: Arc::clone(&hook),
            }))
            .build()
            .unwrap();

        app.run_until(async {
            // give the one-shot platform time to deliver and the runtime
            // time to process
            for _ in 0..200 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if !hook.sent.lock().is_empty() {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook.sent.lock()[0].content, "pong");
    }

    #[tokio::test]
    async fn builder_defaults_build_an_empty_app() {
        let app = TetherApp::builder()
            .config(TetherConfig::default())
            .build()
            .unwrap();
        assert_eq!(app.supervisor().runtime_count(), 0);
        app.run_until(async {}).await.unwrap();
    }
}
