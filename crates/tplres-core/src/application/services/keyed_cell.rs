//! A lazily computed value cached for one key at a time.
//!
//! Readers take the shared lock and compare the key. On a miss the writer
//! re-checks under the exclusive lock before computing, so concurrent misses
//! for the same key compute once. A different key replaces the cached value.

use std::sync::Arc;

use parking_lot::RwLock;

pub struct KeyedCell<K, V> {
    slot: RwLock<Option<(K, Arc<V>)>>,
}

impl<K: PartialEq, V> KeyedCell<K, V> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Cached value for `key`, or the result of `init` published for `key`.
    ///
    /// `init` errors are returned and nothing is cached.
    pub fn get_or_try_init<E>(
        &self,
        key: K,
        init: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some((cached, value)) = self.slot.read().as_ref() {
            if *cached == key {
                return Ok(Arc::clone(value));
            }
        }

        let mut slot = self.slot.write();
        if let Some((cached, value)) = slot.as_ref() {
            if *cached == key {
                return Ok(Arc::clone(value));
            }
        }
        let value = Arc::new(init(&key)?);
        *slot = Some((key, Arc::clone(&value)));
        Ok(value)
    }

    pub fn get_or_init(&self, key: K, init: impl FnOnce(&K) -> V) -> Arc<V> {
        match self.get_or_try_init::<std::convert::Infallible>(key, |k| Ok(init(k))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}

impl<K: PartialEq, V> Default for KeyedCell<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
