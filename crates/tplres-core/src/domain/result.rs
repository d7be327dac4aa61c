//! Loading results: the outcome of asking one source for one name.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use crate::domain::identity::{SourceId, Version};

/// Content handle of an opened template.
///
/// In-memory stores hand out shared buffers; stores backed by I/O hand out a
/// reader so the caller decides when (and whether) to pay for reading.
pub enum Content {
    Text(Arc<str>),
    Bytes(Arc<[u8]>),
    Reader(Box<dyn Read + Send>),
}

impl Content {
    /// Read the whole content as UTF-8 text.
    ///
    /// Byte content that is not valid UTF-8 yields an
    /// [`io::ErrorKind::InvalidData`] error.
    pub fn into_string(self) -> io::Result<String> {
        match self {
            Self::Text(text) => Ok(text.to_string()),
            Self::Bytes(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Self::Reader(mut reader) => {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    /// Read the whole content as raw bytes.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
            Self::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(Arc::from(text))
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::from(bytes))
    }
}

/// A template that was found and opened.
#[derive(Debug)]
pub struct Loaded {
    /// Store that produced the content.
    pub source: SourceId,
    /// `None` when the store cannot detect changes.
    pub version: Option<Version>,
    pub content: Content,
}

/// Status tag of a [`LoadingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingStatus {
    NotFound,
    NotModified,
    Opened,
}

impl fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not found",
            Self::NotModified => "not modified",
            Self::Opened => "opened",
        })
    }
}

/// Outcome of one `load` call.
///
/// `NotFound` is an expected status, not a failure. `NotModified` tells the
/// caller to keep using whatever it built from the previous resolution.
#[derive(Debug)]
pub enum LoadingResult {
    NotFound,
    NotModified(SourceId),
    Opened(Loaded),
}

impl LoadingResult {
    pub fn opened(source: SourceId, version: Option<Version>, content: Content) -> Self {
        Self::Opened(Loaded {
            source,
            version,
            content,
        })
    }

    pub fn status(&self) -> LoadingStatus {
        match self {
            Self::NotFound => LoadingStatus::NotFound,
            Self::NotModified(_) => LoadingStatus::NotModified,
            Self::Opened(_) => LoadingStatus::Opened,
        }
    }

    /// `true` for `Opened` and `NotModified`: the source answered for the name.
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Identity of the store that answered, if any.
    pub fn source(&self) -> Option<&SourceId> {
        match self {
            Self::NotFound => None,
            Self::NotModified(source) => Some(source),
            Self::Opened(loaded) => Some(&loaded.source),
        }
    }

    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Opened(loaded) => loaded.version.as_ref(),
            _ => None,
        }
    }

    pub fn into_loaded(self) -> Option<Loaded> {
        match self {
            Self::Opened(loaded) => Some(loaded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_bytes_decode() {
        assert_eq!(Content::from("hi").into_string().unwrap(), "hi");
        assert_eq!(Content::from(b"hi".to_vec()).into_string().unwrap(), "hi");
    }

    #[test]
    fn invalid_utf8_is_invalid_data() {
        let err = Content::from(vec![0xff, 0xfe]).into_string().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn reader_is_drained() {
        let content = Content::Reader(Box::new(io::Cursor::new(b"streamed".to_vec())));
        assert_eq!(content.into_bytes().unwrap(), b"streamed");
    }

    #[test]
    fn status_and_source() {
        let id = SourceId::allocate("test");
        let opened = LoadingResult::opened(id.clone(), Some(Version::from(1)), "x".into());
        assert_eq!(opened.status(), LoadingStatus::Opened);
        assert_eq!(opened.source(), Some(&id));
        assert_eq!(opened.version(), Some(&Version::from(1)));

        let unchanged = LoadingResult::NotModified(id.clone());
        assert!(unchanged.is_found());
        assert_eq!(unchanged.version(), None);

        assert!(!LoadingResult::NotFound.is_found());
        assert_eq!(LoadingResult::NotFound.source(), None);
    }
}
