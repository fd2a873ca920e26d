//! Per-runtime key/value scratch store.
//!
//! Handlers running on the same runtime can pass data to each other through
//! this store; it lives exactly as long as the runtime does. Values are
//! stored type-erased and retrieved by key plus downcast.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// A clonable handle to a runtime's scratch map.
///
/// Cloning is cheap and all clones observe the same underlying map.
#[derive(Clone, Default)]
pub struct KeyValueStore {
    inner: Arc<Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn put<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.inner.lock().insert(key.into(), Box::new(value));
    }

    /// Returns a clone of the value stored under `key`, if present and of
    /// type `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.inner
            .lock()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove<T: 'static>(&self, key: &str) -> Option<T> {
        let value = self.inner.lock().remove(key)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("len", &self.inner.lock().len())
            .finish()
    }
}
