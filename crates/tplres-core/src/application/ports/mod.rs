//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `tplres-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by the resolver, implemented by stores
//!   - `Source`: template lookup
//!   - `Session`: per-operation store state
//!
//! - **Driving (Input) Ports**: the resolver re-exposes `Source` itself, so
//!   callers use a composite exactly like a single store.

pub mod output;

pub use output::{AsAny, Session, Source};
