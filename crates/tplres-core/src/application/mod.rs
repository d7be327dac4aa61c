//! Application layer for tplres.
//!
//! This layer contains:
//! - **Ports**: the `Source` and `Session` traits stores implement
//! - **Session**: owned session handles and scoped acquisition
//! - **Services**: the composite resolver and its caches
//!
//! Value types and validation live in `crate::domain`.

pub mod ports;
pub mod services;
pub mod session;

pub use ports::{Session, Source};
pub use services::{KeyedCell, MultiSession, MultiSource, MultiSourceBuilder, StickyTable};
pub use session::{SessionHandle, SessionOutcome, with_session};
