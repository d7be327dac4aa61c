//! MultiSource - an ordered composite of sources.
//!
//! Resolution workflow for one `load(name, ..)`:
//! 1. Sticky mode on and `name` pinned: probe the pinned member first. A hit
//!    is returned; a `NotFound` falls through to the scan.
//! 2. Scan every member in configured order (skipping the one already
//!    probed). The first member that answers wins and, in sticky mode, is
//!    pinned for `name`.
//! 3. Nobody answers: unpin `name` and report `NotFound`.
//!
//! A member failure aborts the load immediately and is returned unchanged;
//! later members are not consulted.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, trace};

use crate::{
    application::{
        ports::{Session, Source},
        services::sticky::StickyTable,
        session::SessionHandle,
    },
    domain::{LoadingResult, SourceId, TemplateName, Version},
    error::{SourceError, SourceResult},
};

/// Composite source that asks its members in order.
///
/// The member sequence is fixed at construction. Sticky mode is on by
/// default and can be toggled with [`MultiSource::set_sticky`], which is an
/// administrative operation and not meant to be called per lookup.
pub struct MultiSource {
    id: SourceId,
    sources: Vec<Arc<dyn Source>>,
    sticky: AtomicBool,
    table: StickyTable,
}

impl MultiSource {
    /// Create a sticky composite over `sources`, asked in the given order.
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self {
            id: SourceId::allocate("multi"),
            sources,
            sticky: AtomicBool::new(true),
            table: StickyTable::new(),
        }
    }

    pub fn builder() -> MultiSourceBuilder {
        MultiSourceBuilder::default()
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky.load(Ordering::Acquire)
    }

    /// Turn sticky mode on or off.
    ///
    /// Every change of setting forgets every pin. Loads already in flight
    /// may run with either setting, so a load that started in sticky mode
    /// can still pin a name after sticky was turned off. Turning sticky back
    /// on drops such leftovers.
    pub fn set_sticky(&self, sticky: bool) {
        let was = self.sticky.swap(sticky, Ordering::AcqRel);
        if was != sticky {
            self.table.clear();
            info!(source = %self.id, sticky, "sticky mode changed");
        }
    }

    /// Forget every pin.
    pub fn clear_sticky(&self) {
        self.table.clear();
    }

    /// Forget the pin for one name.
    pub fn forget(&self, name: &TemplateName) {
        self.table.remove(name.as_str());
    }

    /// Member currently pinned for `name`, if any.
    pub fn pinned(&self, name: &TemplateName) -> Option<&SourceId> {
        self.table
            .get(name.as_str())
            .and_then(|slot| self.sources.get(slot))
            .map(|source| source.id())
    }

    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn session<'s>(&self, session: &'s mut SessionHandle) -> SourceResult<&'s mut MultiSession> {
        let multi = session.downcast_for::<MultiSession>(&self.id)?;
        if multi.owner != self.id {
            return Err(SourceError::SessionMismatch {
                source_id: self.id.clone(),
            });
        }
        Ok(multi)
    }

    /// Ask the member at `slot`. Previous-resolution hints are only passed to
    /// the member they belong to.
    fn load_from(
        &self,
        slot: usize,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut MultiSession,
    ) -> SourceResult<LoadingResult> {
        let source = &self.sources[slot];
        let (previous_source, previous_version) = match previous_source {
            Some(id) if source.owns(id) => (Some(id), previous_version),
            _ => (None, None),
        };
        let handle = session.child(slot, source.as_ref())?;
        source.load(name, previous_source, previous_version, handle)
    }
}

impl Source for MultiSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn owns(&self, id: &SourceId) -> bool {
        self.id == *id || self.sources.iter().any(|source| source.owns(id))
    }

    fn open_session(&self) -> SourceResult<SessionHandle> {
        Ok(SessionHandle::new(MultiSession {
            owner: self.id.clone(),
            children: self.sources.iter().map(|_| None).collect(),
        }))
    }

    #[instrument(skip_all, fields(source = %self.id, name = %name, session = %session.id()))]
    fn load(
        &self,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut SessionHandle,
    ) -> SourceResult<LoadingResult> {
        let sticky = self.is_sticky();
        let multi = self.session(session)?;

        let pinned = if sticky {
            self.table.get(name.as_str())
        } else {
            None
        };

        if let Some(slot) = pinned {
            let result = self.load_from(slot, name, previous_source, previous_version, multi)?;
            if result.is_found() {
                trace!(slot, status = %result.status(), "sticky hit");
                self.table.pin(name.as_str(), slot);
                return Ok(result);
            }
            debug!(slot, "pinned source no longer has the template, rescanning");
        }

        for slot in 0..self.sources.len() {
            if pinned == Some(slot) {
                continue;
            }
            let result = self.load_from(slot, name, previous_source, previous_version, multi)?;
            if result.is_found() {
                if sticky {
                    self.table.pin(name.as_str(), slot);
                }
                debug!(
                    slot,
                    winner = %self.sources[slot].id(),
                    status = %result.status(),
                    "resolved"
                );
                return Ok(result);
            }
        }

        if sticky {
            self.table.remove(name.as_str());
        }
        debug!("not found in any source");
        Ok(LoadingResult::NotFound)
    }

    fn list(&self) -> SourceResult<Option<Vec<TemplateName>>> {
        let mut names = BTreeSet::new();
        let mut enumerable = false;
        for source in &self.sources {
            if let Some(listed) = source.list()? {
                enumerable = true;
                names.extend(listed);
            }
        }
        Ok(enumerable.then(|| names.into_iter().collect()))
    }
}

impl fmt::Display for MultiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MultiSource(")?;
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", source.id())?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for MultiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSource")
            .field("id", &self.id)
            .field(
                "sources",
                &self.sources.iter().map(|s| s.id()).collect::<Vec<_>>(),
            )
            .field("sticky", &self.is_sticky())
            .field("table", &self.table)
            .finish()
    }
}

/// Session of a [`MultiSource`]: one lazily opened member session per slot.
pub struct MultiSession {
    owner: SourceId,
    children: Vec<Option<SessionHandle>>,
}

impl MultiSession {
    /// Member session for `slot`, opened the first time it is needed.
    fn child(&mut self, slot: usize, source: &dyn Source) -> SourceResult<&mut SessionHandle> {
        let handle = match self.children[slot].take() {
            Some(handle) => handle,
            None => {
                trace!(slot, member = %source.id(), "opening member session");
                source.open_session()?
            }
        };
        Ok(self.children[slot].insert(handle))
    }

    /// Number of member sessions opened so far.
    pub fn opened(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }
}

impl Session for MultiSession {
    /// Release every member session that was opened, collecting all failures.
    fn close(&mut self) -> SourceResult<()> {
        let failures: Vec<SourceError> = self
            .children
            .iter_mut()
            .filter_map(Option::as_mut)
            .filter_map(|handle| handle.release().err())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SourceError::Release { failures })
        }
    }
}

/// Builder for [`MultiSource`].
#[derive(Default)]
pub struct MultiSourceBuilder {
    sources: Vec<Arc<dyn Source>>,
    sticky: Option<bool>,
}

impl MultiSourceBuilder {
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add a member that is also held elsewhere (so the caller can keep
    /// mutating it).
    pub fn shared(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = Some(sticky);
        self
    }

    pub fn build(self) -> MultiSource {
        let multi = MultiSource::new(self.sources);
        if let Some(sticky) = self.sticky {
            multi.sticky.store(sticky, Ordering::Release);
        }
        multi
    }
}
