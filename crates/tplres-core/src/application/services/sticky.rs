//! Sticky table: which member of a composite answered a name last time.
//!
//! Backed by a `DashMap`, so lookups for unrelated names do not contend on
//! one lock and a reader sees either no entry or a fully written one.
//!
//! Two resolutions of the same name may race to write its entry. The last
//! writer wins. That only changes which member is probed first next time;
//! a wrong guess is corrected by the rescan that follows a `NotFound`.

use dashmap::DashMap;

/// Concurrent map from template name to member slot.
#[derive(Debug, Default)]
pub struct StickyTable {
    pins: DashMap<String, usize>,
}

impl StickyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.pins.get(name).map(|slot| *slot)
    }

    /// Pin `name` to `slot`. A matching entry is left untouched, so the
    /// common "confirm" path only takes a shard read lock.
    pub fn pin(&self, name: &str, slot: usize) {
        if self.get(name) == Some(slot) {
            return;
        }
        self.pins.insert(name.to_owned(), slot);
    }

    pub fn remove(&self, name: &str) -> Option<usize> {
        self.pins.remove(name).map(|(_, slot)| slot)
    }

    pub fn clear(&self) {
        self.pins.clear();
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
