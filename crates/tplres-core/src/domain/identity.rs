//! Source identities and version tokens.
//!
//! Both are opaque to the resolver: it only compares them. Stores decide what
//! a version means (a revision counter, a modification time, a hash).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Stable identity of one configured backing store.
///
/// Identities are allocated with a process-wide sequence number, so two
/// stores of the same kind never compare equal. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Arc<str>);

static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    /// Allocate a fresh identity: `allocate("string")` yields `string#<n>`.
    pub fn allocate(kind: impl fmt::Display) -> Self {
        let seq = NEXT_SOURCE.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("{kind}#{seq}")))
    }

    /// Wrap an identity received from elsewhere (a previous resolution
    /// reported by the CLI, a persisted cache entry).
    pub fn from_raw(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-defined token describing one revision of a template's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Version {
    fn from(revision: u64) -> Self {
        Self(revision.to_string())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
