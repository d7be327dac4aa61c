//! Driven (output) ports - implemented by backing stores.
//!
//! These traits define what the resolver needs from a store. The
//! `tplres-adapters` crate provides implementations; [`MultiSource`] also
//! implements [`Source`], so composites nest.
//!
//! [`MultiSource`]: crate::application::services::MultiSource

use std::any::Any;

use crate::application::session::SessionHandle;
use crate::domain::{LoadingResult, SourceId, TemplateName, Version};
use crate::error::SourceResult;

/// Port for template lookup.
///
/// Implemented by:
/// - `tplres_adapters::StringSource` (in-memory text)
/// - `tplres_adapters::ByteSource` (in-memory bytes)
/// - `tplres_adapters::FileSystemSource` (a directory tree)
/// - [`MultiSource`](crate::application::services::MultiSource) (an ordered composite)
///
/// ## Contract
///
/// - `load` may answer `NotModified` only when `previous_source` identifies
///   this store and `previous_version` equals the current version. A store
///   that cannot confirm cheaply re-resolves and answers `Opened`.
/// - Both hints may be `None`; that is a fresh lookup.
/// - A store must reject a session it did not open
///   ([`SourceError::SessionMismatch`]) and a released one
///   ([`SourceError::SessionReleased`]).
/// - Apart from the session it is given, `load` mutates nothing the caller
///   can observe.
///
/// [`SourceError::SessionMismatch`]: crate::error::SourceError::SessionMismatch
/// [`SourceError::SessionReleased`]: crate::error::SourceError::SessionReleased
pub trait Source: Send + Sync {
    /// Identity reported on every result this store produces.
    fn id(&self) -> &SourceId;

    /// Whether `id` names this store (or, for composites, one of its members).
    fn owns(&self, id: &SourceId) -> bool {
        self.id() == id
    }

    /// Allocate the per-operation state for a batch of lookups.
    ///
    /// Failures here are fatal to the caller's operation.
    fn open_session(&self) -> SourceResult<SessionHandle>;

    /// Try to resolve `name`.
    fn load(
        &self,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut SessionHandle,
    ) -> SourceResult<LoadingResult>;

    /// Names this store can answer for, when it can enumerate them cheaply.
    ///
    /// `Ok(None)` means "not enumerable", not "empty".
    fn list(&self) -> SourceResult<Option<Vec<TemplateName>>> {
        Ok(None)
    }
}

/// Per-operation state a store hands out from [`Source::open_session`].
///
/// Sessions are owned by the caller and closed exactly once through
/// [`SessionHandle::release`].
pub trait Session: AsAny + Send {
    fn close(&mut self) -> SourceResult<()>;
}

/// Downcasting support so a store can recover its own session type.
pub trait AsAny {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
