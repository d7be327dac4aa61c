//! In-memory template stores.
//!
//! [`StringSource`] holds template text, [`ByteSource`] raw bytes. Both are
//! the same [`MemorySource`] over a different value type. Each `put` bumps a
//! per-store revision counter and stamps the entry with it, so the version of
//! a template changes whenever it is replaced.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use tplres_core::{
    application::{
        ports::{Session, Source},
        session::SessionHandle,
    },
    domain::{Content, LoadingResult, SourceId, TemplateName, Version},
    error::{SourceError, SourceResult},
};

/// Value a [`MemorySource`] can hold.
pub trait MemoryValue: Clone + Send + Sync + 'static {
    /// Prefix of the store's [`SourceId`].
    const KIND: &'static str;

    fn to_content(&self) -> Content;
}

impl MemoryValue for Arc<str> {
    const KIND: &'static str = "string";

    fn to_content(&self) -> Content {
        Content::Text(Arc::clone(self))
    }
}

impl MemoryValue for Arc<[u8]> {
    const KIND: &'static str = "bytes";

    fn to_content(&self) -> Content {
        Content::Bytes(Arc::clone(self))
    }
}

/// Store of template text.
pub type StringSource = MemorySource<Arc<str>>;

/// Store of raw template bytes.
pub type ByteSource = MemorySource<Arc<[u8]>>;

struct Entry<V> {
    value: V,
    version: Version,
}

struct Inner<V> {
    id: SourceId,
    revision: AtomicU64,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

/// Thread-safe in-memory store. Clones share the same entries and identity.
pub struct MemorySource<V: MemoryValue> {
    inner: Arc<Inner<V>>,
}

impl<V: MemoryValue> MemorySource<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: SourceId::allocate(V::KIND),
                revision: AtomicU64::new(0),
                entries: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Add or replace a template.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Domain`] when `name` is not a valid template
    /// name.
    pub fn put(&self, name: &str, value: impl Into<V>) -> SourceResult<()> {
        let name = TemplateName::new(name)?;
        let revision = self.inner.revision.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.entries.write().insert(
            name.into(),
            Entry {
                value: value.into(),
                version: Version::from(revision),
            },
        );
        Ok(())
    }

    /// Builder-style [`Self::put`].
    pub fn with(self, name: &str, value: impl Into<V>) -> SourceResult<Self> {
        self.put(name, value)?;
        Ok(self)
    }

    /// Remove a template. Returns `false` when it was not present.
    pub fn remove(&self, name: &str) -> bool {
        match TemplateName::new(name) {
            Ok(name) => self.inner.entries.write().remove(name.as_str()).is_some(),
            Err(_) => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        TemplateName::new(name)
            .is_ok_and(|name| self.inner.entries.read().contains_key(name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<TemplateName> {
        let mut names: Vec<TemplateName> = self
            .inner
            .entries
            .read()
            .keys()
            .filter_map(|key| TemplateName::new(key).ok())
            .collect();
        names.sort();
        names
    }
}

impl<V: MemoryValue> Clone for MemorySource<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: MemoryValue> Default for MemorySource<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: MemoryValue> fmt::Debug for MemorySource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("id", &self.inner.id)
            .field("len", &self.len())
            .finish()
    }
}

/// Session of a memory store. It only records which store opened it.
struct MemorySession {
    owner: SourceId,
}

impl Session for MemorySession {
    fn close(&mut self) -> SourceResult<()> {
        Ok(())
    }
}

impl<V: MemoryValue> Source for MemorySource<V> {
    fn id(&self) -> &SourceId {
        &self.inner.id
    }

    fn open_session(&self) -> SourceResult<SessionHandle> {
        Ok(SessionHandle::new(MemorySession {
            owner: self.inner.id.clone(),
        }))
    }

    #[instrument(skip_all, fields(source = %self.inner.id, name = %name))]
    fn load(
        &self,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut SessionHandle,
    ) -> SourceResult<LoadingResult> {
        let id = &self.inner.id;
        let memory = session.downcast_for::<MemorySession>(id)?;
        if memory.owner != *id {
            return Err(SourceError::SessionMismatch {
                source_id: id.clone(),
            });
        }

        let entries = self.inner.entries.read();
        let Some(entry) = entries.get(name.as_str()) else {
            trace!("not stored");
            return Ok(LoadingResult::NotFound);
        };

        if previous_source == Some(id) && previous_version == Some(&entry.version) {
            debug!(version = %entry.version, "not modified");
            return Ok(LoadingResult::NotModified(id.clone()));
        }

        Ok(LoadingResult::opened(
            id.clone(),
            Some(entry.version.clone()),
            entry.value.to_content(),
        ))
    }

    fn list(&self) -> SourceResult<Option<Vec<TemplateName>>> {
        Ok(Some(self.names()))
    }
}
