//! The per-conversation runtime.
//!
//! A [`Runtime`] is one logical conversation: a command invocation and
//! every component click or modal submit that follows from it. Each runtime
//! owns a FIFO event queue and exactly one worker task that dequeues and
//! fully processes one event before taking the next — the concurrency
//! boundary guaranteeing at-most-one handler execution per conversation,
//! while distinct runtimes execute in parallel.
//!
//! Besides the queue, a runtime carries the state that makes conversations
//! stateful: one lazily created controller instance per handler type, a
//! key/value scratch store, and the most recently sent reply for
//! edit-in-place semantics.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, span};

use tether_core::definition::{ControllerDescriptor, Instance};
use tether_core::event::InteractionEvent;
use tether_core::gateway::MessageRef;
use tether_core::kv::KeyValueStore;

use crate::config::ExpirationStrategy;
use crate::handling::Engine;

struct RuntimeInner {
    id: String,
    queue: Mutex<Option<mpsc::UnboundedSender<InteractionEvent>>>,
    cancel: CancellationToken,
    instances: Mutex<HashMap<TypeId, Instance>>,
    kv: KeyValueStore,
    latest_reply: Mutex<Option<MessageRef>>,
    last_activity: Mutex<Instant>,
    expiration: ExpirationStrategy,
}

/// Handle to one conversation's execution context.
///
/// Cloning is cheap; all clones refer to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Creates a runtime and starts its worker task.
    pub(crate) fn spawn(engine: Arc<Engine>, expiration: ExpirationStrategy) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runtime = Self {
            inner: Arc::new(RuntimeInner {
                id: uuid::Uuid::new_v4().simple().to_string(),
                queue: Mutex::new(Some(tx)),
                cancel: CancellationToken::new(),
                instances: Mutex::new(HashMap::new()),
                kv: KeyValueStore::new(),
                latest_reply: Mutex::new(None),
                last_activity: Mutex::new(Instant::now()),
                expiration,
            }),
        };

        let worker = runtime.clone();
        tokio::spawn(async move {
            debug!(runtime = %worker.id(), "Runtime started");
            loop {
                let event = tokio::select! {
                    _ = worker.inner.cancel.cancelled() => None,
                    event = rx.recv() => event,
                };
                let Some(event) = event else { break };

                worker.touch();
                let span = span!(
                    Level::DEBUG,
                    "runtime",
                    id = %worker.id(),
                    event = event.kind().name()
                );
                engine.handle(event, &worker).instrument(span).await;
            }
            // sealed runtimes end here without an explicit close
            worker.inner.cancel.cancel();
            debug!(runtime = %worker.id(), "Runtime finished");
        });

        runtime
    }

    /// The runtime's unique id, used as the custom-id scope of every bound
    /// component this runtime sends.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Enqueues an event for sequential processing.
    ///
    /// Safe to call from any thread; never blocks. Returns `false` when
    /// the runtime is already closed.
    pub(crate) fn enqueue(&self, event: InteractionEvent) -> bool {
        if self.inner.cancel.is_cancelled() {
            return false;
        }
        match &*self.inner.queue.lock() {
            Some(queue) => queue.send(event).is_ok(),
            None => false,
        }
    }

    /// Drops the queue's sender so the worker exits once the already
    /// enqueued events are drained. Used for the throwaway runtimes of
    /// independent components.
    pub(crate) fn seal(&self) {
        self.inner.queue.lock().take();
    }

    /// Closes the runtime: the worker wakes from its queue wait and exits,
    /// abandoning any still-queued events. Idempotent.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    /// Applies the expiration strategy and reports whether this runtime is
    /// closed. An expired runtime is closed as a side effect.
    pub(crate) fn is_closed(&self) -> bool {
        if let ExpirationStrategy::Inactivity(timeout) = self.inner.expiration {
            let idle = self.inner.last_activity.lock().elapsed();
            if idle >= timeout {
                debug!(runtime = %self.id(), "Runtime expired after inactivity");
                self.close();
            }
        }
        self.inner.cancel.is_cancelled()
    }

    /// Returns the cached controller instance, creating it on first use.
    ///
    /// The cache lives for the runtime's lifetime, giving handler types
    /// implicit per-conversation state without any global mutable state.
    pub(crate) fn instance(&self, controller: &ControllerDescriptor) -> Instance {
        let mut instances = self.inner.instances.lock();
        instances
            .entry(controller.type_id())
            .or_insert_with(|| controller.instantiate())
            .clone()
    }

    /// The runtime's key/value scratch store.
    pub fn kv(&self) -> KeyValueStore {
        self.inner.kv.clone()
    }

    /// The most recently sent reply, target of edit-in-place replies.
    pub(crate) fn latest_reply(&self) -> Option<MessageRef> {
        *self.inner.latest_reply.lock()
    }

    pub(crate) fn set_latest_reply(&self, message: MessageRef) {
        *self.inner.latest_reply.lock() = Some(message);
    }

    fn touch(&self) {
        *self.inner.last_activity.lock() = Instant::now();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.inner.id)
            .field("closed", &self.inner.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tether_core::definition::OptionKind;
    use tether_core::event::{InteractionKind, OptionInput, OptionValue, UserRef};
    use tether_core::interactions::SlashCommandDefinition;
    use tether_core::registry::InteractionRegistry;
    use tether_core::definition::OptionDescriptor;

    use crate::testing::{RecordingHook, engine_for, wait_until};

    #[derive(Default)]
    struct OrderCmd;

    fn order_engine(seen: Arc<Mutex<Vec<i64>>>) -> Arc<Engine> {
        let registry = InteractionRegistry::builder()
            .register(
                SlashCommandDefinition::builder::<OrderCmd>("record")
                    .command("record")
                    .option(OptionDescriptor::required("value", OptionKind::Integer))
                    .handler(move |_cmd, inv| {
                        let seen = Arc::clone(&seen);
                        async move {
                            seen.lock().push(inv.arg(0).as_int().unwrap_or(-1));
                        }
                    }),
            )
            .build();
        engine_for(registry)
    }

    fn record_event(value: i64, hook: Arc<RecordingHook>) -> InteractionEvent {
        InteractionEvent::new(
            InteractionKind::SlashCommand {
                command: "record".into(),
                options: vec![OptionInput::new("value", OptionValue::Integer(value))],
            },
            UserRef::new(7, "ada"),
            hook,
        )
    }

    #[tokio::test]
    async fn events_are_processed_in_arrival_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = order_engine(Arc::clone(&seen));
        let runtime = Runtime::spawn(engine, ExpirationStrategy::Never);
        let hook = Arc::new(RecordingHook::new());

        for value in 1..=50 {
            assert!(runtime.enqueue(record_event(value, hook.clone())));
        }

        wait_until(|| seen.lock().len() == 50).await;
        assert_eq!(*seen.lock(), (1..=50).collect::<Vec<_>>());
        runtime.close();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_keep_their_own_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = order_engine(Arc::clone(&seen));
        let runtime = Runtime::spawn(engine, ExpirationStrategy::Never);
        let hook = Arc::new(RecordingHook::new());

        let mut producers = Vec::new();
        for producer in 0..3i64 {
            let runtime = runtime.clone();
            let hook = hook.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..40 {
                    runtime.enqueue(record_event(producer * 1000 + i, hook.clone()));
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        wait_until(|| seen.lock().len() == 120).await;
        let seen = seen.lock();
        for producer in 0..3i64 {
            let own: Vec<i64> = seen
                .iter()
                .copied()
                .filter(|v| v / 1000 == producer)
                .collect();
            let expected: Vec<i64> = (0..40).map(|i| producer * 1000 + i).collect();
            assert_eq!(own, expected, "producer {producer} order violated");
        }
        runtime.close();
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_new_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = order_engine(Arc::clone(&seen));
        let runtime = Runtime::spawn(engine, ExpirationStrategy::Never);
        let hook = Arc::new(RecordingHook::new());

        runtime.close();
        runtime.close();
        assert!(runtime.is_closed());
        assert!(!runtime.enqueue(record_event(1, hook)));
    }

    #[tokio::test]
    async fn inactivity_expiration_closes_the_runtime() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = order_engine(seen);
        let runtime = Runtime::spawn(engine, ExpirationStrategy::Inactivity(Duration::ZERO));
        wait_until(|| runtime.is_closed()).await;
    }

    #[tokio::test]
    async fn instance_cache_returns_the_same_instance() {
        #[derive(Default)]
        struct Stateful {
            counter: AtomicUsize,
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = order_engine(seen);
        let runtime = Runtime::spawn(engine, ExpirationStrategy::Never);

        let descriptor = tether_core::definition::ControllerDescriptor::of::<Stateful>();
        let first = runtime.instance(&descriptor);
        let second = runtime.instance(&descriptor);
        assert!(Arc::ptr_eq(&first, &second));

        let stateful = first.downcast::<Stateful>().unwrap();
        stateful.counter.fetch_add(1, Ordering::SeqCst);
        runtime.close();
    }
}
