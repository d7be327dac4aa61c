//! Core domain layer for tplres.
//!
//! Pure values with no I/O: template names, source identities, version
//! tokens, content handles and loading results. Everything that touches a
//! backing store goes through the ports in `crate::application`.

pub mod error;
pub mod identity;
pub mod name;
pub mod result;

pub use error::{DomainError, ErrorCategory};
pub use identity::{SourceId, Version};
pub use name::TemplateName;
pub use result::{Content, Loaded, LoadingResult, LoadingStatus};
