//! tplres Core - template source resolution
//!
//! This crate provides the domain values and the application layer for
//! locating template text by name across one or more backing stores,
//! following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            tplres-cli (CLI)             │
//! │       (resolve, list, config, ..)       │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │  (MultiSource, StickyTable, sessions)   │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │           (Source, Session)             │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    tplres-adapters (Infrastructure)     │
//! │  (StringSource, ByteSource, FileSystem) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Values)      │
//! │ (TemplateName, SourceId, LoadingResult) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tplres_core::prelude::*;
//!
//! let multi = MultiSource::builder()
//!     .source(overrides)
//!     .source(defaults)
//!     .build();
//!
//! let name = TemplateName::new("mail/welcome.ftl")?;
//! let result = with_session(&multi, |session| multi.load(&name, None, None, session))
//!     .into_result()?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        MultiSource, MultiSourceBuilder, SessionHandle, SessionOutcome, with_session,
        ports::{Session, Source},
    };
    pub use crate::domain::{
        Content, Loaded, LoadingResult, LoadingStatus, SourceId, TemplateName, Version,
    };
    pub use crate::error::{SourceError, SourceResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
