//! Unified error handling for tplres core.
//!
//! Failures raised by backing stores carry the [`SourceId`] of the store that
//! raised them; the composite resolver passes them through unchanged so the
//! caller can always tell which store is broken.

use thiserror::Error;

use crate::domain::{DomainError, SourceId};

/// Root error type for source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Domain validation failed (bad template name, bad configuration).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A store failed while performing I/O for a template.
    #[error("I/O error in source '{source_id}' while loading '{name}': {error}")]
    Io {
        source_id: SourceId,
        name: String,
        #[source]
        error: std::io::Error,
    },

    /// A store failed for a non-I/O reason.
    #[error("Source '{source_id}' failed: {reason}")]
    Backend { source_id: SourceId, reason: String },

    /// A session was handed to a store that did not open it.
    #[error("Session passed to source '{source_id}' was not opened by it")]
    SessionMismatch { source_id: SourceId },

    /// A session was used after it had been released.
    #[error("Session for source '{source_id}' has already been released")]
    SessionReleased { source_id: SourceId },

    /// One or more sessions failed to release.
    #[error("Failed to release {} session(s): {}", .failures.len(), join_failures(.failures))]
    Release { failures: Vec<SourceError> },
}

fn join_failures(failures: &[SourceError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SourceError {
    pub fn io(source_id: &SourceId, name: impl Into<String>, error: std::io::Error) -> Self {
        Self::Io {
            source_id: source_id.clone(),
            name: name.into(),
            error,
        }
    }

    pub fn backend(source_id: &SourceId, reason: impl Into<String>) -> Self {
        Self::Backend {
            source_id: source_id.clone(),
            reason: reason.into(),
        }
    }

    /// Identity of the store that raised this error, when there is exactly one.
    pub fn source_id(&self) -> Option<&SourceId> {
        match self {
            Self::Io { source_id, .. }
            | Self::Backend { source_id, .. }
            | Self::SessionMismatch { source_id }
            | Self::SessionReleased { source_id } => Some(source_id),
            Self::Domain(_) | Self::Release { .. } => None,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Io { source_id, name, .. } => vec![
                format!("Source '{}' could not read '{}'", source_id, name),
                "Check that the backing store is reachable and readable".into(),
            ],
            Self::Backend { source_id, .. } => vec![
                format!("Source '{}' reported a failure", source_id),
                "Inspect the store's own logs for details".into(),
            ],
            Self::SessionMismatch { .. } | Self::SessionReleased { .. } => vec![
                "Open one session per resolution pass and pass it to the same source".into(),
                "This is a bug in the calling code, please report it".into(),
            ],
            Self::Release { failures } => failures.iter().flat_map(Self::suggestions).collect(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Io { .. } | Self::Backend { .. } | Self::Release { .. } => {
                ErrorCategory::Internal
            }
            Self::SessionMismatch { .. } | Self::SessionReleased { .. } => ErrorCategory::Internal,
        }
    }
}

pub use crate::domain::ErrorCategory;

/// Convenient result type alias.
pub type SourceResult<T> = Result<T, SourceError>;
