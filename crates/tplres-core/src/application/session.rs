//! Session ownership.
//!
//! A [`SessionHandle`] is what [`Source::open_session`] hands to the caller.
//! The caller owns it for one logical operation and releases it once; if it
//! is dropped unreleased (early return, panic unwinding) the handle releases
//! itself and logs any failure.
//!
//! [`with_session`] wraps the whole acquisition and keeps the primary result
//! and the release result apart, so a release failure can neither replace a
//! primary failure nor turn a success into an error.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{Session, Source};
use crate::domain::SourceId;
use crate::error::{SourceError, SourceResult};

/// Owned handle to a store session.
pub struct SessionHandle {
    id: Uuid,
    inner: Option<Box<dyn Session>>,
    released: bool,
}

impl SessionHandle {
    /// Wrap a store-specific session.
    pub fn new(session: impl Session + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Some(Box::new(session)),
            released: false,
        }
    }

    /// Handle for stores that keep no per-session state.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: None,
            released: false,
        }
    }

    /// Unique id, used to correlate log events of one operation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// `true` when the store attached no session state.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the session as the concrete type `T`, if that is what it holds.
    pub fn downcast_mut<T: Session + 'static>(&mut self) -> Option<&mut T> {
        let session: &mut dyn Session = self.inner.as_deref_mut()?;
        crate::application::ports::AsAny::as_any_mut(session).downcast_mut::<T>()
    }

    /// Like [`Self::downcast_mut`], reporting why the session is unusable for
    /// the store `owner`.
    pub fn downcast_for<T: Session + 'static>(&mut self, owner: &SourceId) -> SourceResult<&mut T> {
        if self.released {
            return Err(SourceError::SessionReleased {
                source_id: owner.clone(),
            });
        }
        self.downcast_mut::<T>()
            .ok_or_else(|| SourceError::SessionMismatch {
                source_id: owner.clone(),
            })
    }

    /// Fail with [`SourceError::SessionReleased`] once the handle is released.
    pub fn ensure_open(&self, owner: &SourceId) -> SourceResult<()> {
        if self.released {
            return Err(SourceError::SessionReleased {
                source_id: owner.clone(),
            });
        }
        Ok(())
    }

    /// Close the underlying session.
    ///
    /// The first call closes; every later call is a no-op returning `Ok(())`.
    pub fn release(&mut self) -> SourceResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match self.inner.take() {
            Some(mut session) => {
                debug!(session = %self.id, "releasing session");
                session.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.release() {
            warn!(session = %self.id, error = %e, "session released on drop failed to close");
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("empty", &self.inner.is_none())
            .field("released", &self.released)
            .finish()
    }
}

/// Result of a scoped session: the operation's own result plus the result of
/// releasing the session afterwards.
#[must_use]
#[derive(Debug)]
pub struct SessionOutcome<T> {
    result: SourceResult<T>,
    release: SourceResult<()>,
}

impl<T> SessionOutcome<T> {
    pub fn result(&self) -> &SourceResult<T> {
        &self.result
    }

    /// Secondary failure raised while releasing the session.
    pub fn release_error(&self) -> Option<&SourceError> {
        self.release.as_ref().err()
    }

    pub fn into_parts(self) -> (SourceResult<T>, SourceResult<()>) {
        (self.result, self.release)
    }

    /// The primary result. A release failure is logged, never returned.
    pub fn into_result(self) -> SourceResult<T> {
        if let Err(e) = &self.release {
            warn!(
                error = %e,
                primary_ok = self.result.is_ok(),
                "session release failed"
            );
        }
        self.result
    }
}

/// Open a session on `source`, run `op` with it, then release it.
///
/// The session is released on every path, including when `op` fails.
pub fn with_session<S, T, F>(source: &S, op: F) -> SessionOutcome<T>
where
    S: Source + ?Sized,
    F: FnOnce(&mut SessionHandle) -> SourceResult<T>,
{
    let mut session = match source.open_session() {
        Ok(session) => session,
        Err(e) => {
            return SessionOutcome {
                result: Err(e),
                release: Ok(()),
            };
        }
    };

    let result = op(&mut session);
    let release = session.release();
    SessionOutcome { result, release }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoadingResult, TemplateName, Version};
    use mockall::mock;

    mock! {
        pub Closing {}
        impl Session for Closing {
            fn close(&mut self) -> SourceResult<()>;
        }
    }

    struct Other;
    impl Session for Other {
        fn close(&mut self) -> SourceResult<()> {
            Ok(())
        }
    }

    fn failing_close(id: &SourceId) -> MockClosing {
        let id = id.clone();
        let mut session = MockClosing::new();
        session
            .expect_close()
            .times(1)
            .returning(move || Err(SourceError::backend(&id, "close failed")));
        session
    }

    /// A store whose sessions are supplied by the test.
    struct Scripted {
        id: SourceId,
        session: parking_lot::Mutex<Option<MockClosing>>,
    }

    impl Scripted {
        fn new(session: MockClosing) -> Self {
            Self {
                id: SourceId::allocate("scripted"),
                session: parking_lot::Mutex::new(Some(session)),
            }
        }
    }

    impl Source for Scripted {
        fn id(&self) -> &SourceId {
            &self.id
        }

        fn open_session(&self) -> SourceResult<SessionHandle> {
            match self.session.lock().take() {
                Some(session) => Ok(SessionHandle::new(session)),
                None => Err(SourceError::backend(&self.id, "no session left")),
            }
        }

        fn load(
            &self,
            _name: &TemplateName,
            _previous_source: Option<&SourceId>,
            _previous_version: Option<&Version>,
            session: &mut SessionHandle,
        ) -> SourceResult<LoadingResult> {
            session.downcast_for::<MockClosing>(&self.id)?;
            Ok(LoadingResult::opened(self.id.clone(), None, "ok".into()))
        }
    }

    #[test]
    fn release_closes_exactly_once() {
        let mut session = MockClosing::new();
        session.expect_close().times(1).returning(|| Ok(()));

        let mut handle = SessionHandle::new(session);
        assert!(handle.release().is_ok());
        assert!(handle.release().is_ok());
        assert!(handle.is_released());
        // Dropping a released handle must not close again.
        drop(handle);
    }

    #[test]
    fn drop_releases_unreleased_handle() {
        let mut session = MockClosing::new();
        session.expect_close().times(1).returning(|| Ok(()));
        drop(SessionHandle::new(session));
    }

    #[test]
    fn drop_swallows_close_failure_after_logging() {
        let id = SourceId::allocate("test");
        drop(SessionHandle::new(failing_close(&id)));
    }

    #[test]
    fn downcast_distinguishes_mismatch_and_released() {
        let owner = SourceId::allocate("owner");

        let mut foreign = SessionHandle::new(Other);
        assert!(matches!(
            foreign.downcast_for::<MockClosing>(&owner),
            Err(SourceError::SessionMismatch { .. })
        ));
        assert!(foreign.downcast_for::<Other>(&owner).is_ok());

        foreign.release().unwrap();
        assert!(matches!(
            foreign.downcast_for::<Other>(&owner),
            Err(SourceError::SessionReleased { .. })
        ));
        assert!(foreign.ensure_open(&owner).is_err());
    }

    #[test]
    fn empty_handle_releases_cleanly() {
        let mut handle = SessionHandle::empty();
        assert!(handle.is_empty());
        assert!(handle.release().is_ok());
        assert!(handle.downcast_mut::<Other>().is_none());
    }

    #[test]
    fn with_session_keeps_success_when_release_fails() {
        let probe = SourceId::allocate("probe");
        let source = Scripted::new(failing_close(&probe));

        let outcome = with_session(&source, |session| {
            let name = TemplateName::new("a.ftl").unwrap();
            source.load(&name, None, None, session)
        });

        assert!(outcome.result().is_ok());
        assert!(outcome.release_error().is_some());
        let result = outcome.into_result().unwrap();
        assert!(result.is_found());
    }

    #[test]
    fn with_session_keeps_primary_failure_over_release_failure() {
        let probe = SourceId::allocate("probe");
        let source = Scripted::new(failing_close(&probe));

        let outcome: SessionOutcome<()> =
            with_session(&source, |_| Err(SourceError::backend(&probe, "primary")));

        let (result, release) = outcome.into_parts();
        assert!(matches!(result, Err(SourceError::Backend { reason, .. }) if reason == "primary"));
        assert!(matches!(release, Err(SourceError::Backend { reason, .. }) if reason == "close failed"));
    }

    #[test]
    fn with_session_reports_open_failure_without_release() {
        let mut session = MockClosing::new();
        session.expect_close().times(1).returning(|| Ok(()));
        let source = Scripted::new(session);

        // Use up the only session.
        let first = with_session(&source, |_| Ok(()));
        assert!(first.into_result().is_ok());

        let second = with_session(&source, |_| Ok(()));
        assert!(second.release_error().is_none());
        assert!(second.into_result().is_err());
    }
}
