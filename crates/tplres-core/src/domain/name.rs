//! Template names.
//!
//! A [`TemplateName`] is the logical key every source is asked about. Names
//! are relative, slash-separated paths; they are normalised once at the edge
//! so sources and the sticky table never see two spellings of the same name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// A validated, normalised template name.
///
/// Normalisation:
/// - `\` becomes `/`
/// - leading `/` is stripped
/// - repeated `/` collapse to one
/// - `.` segments are dropped
///
/// Rejected: empty names (after normalisation), names containing NUL, and
/// names with a `..` segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateName(String);

impl TemplateName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref();

        if raw.contains('\0') {
            return Err(invalid(raw, "contains a NUL character"));
        }

        let unified = raw.replace('\\', "/");
        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(invalid(raw, "'..' segments are not allowed")),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(invalid(raw, "name is empty"));
        }

        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

fn invalid(name: &str, reason: &'static str) -> DomainError {
    DomainError::InvalidName {
        name: name.to_owned(),
        reason,
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TemplateName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TemplateName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TemplateName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TemplateName> for String {
    fn from(name: TemplateName) -> Self {
        name.0
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
