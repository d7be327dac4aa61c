//! Application services - resolution on top of the ports.
//!
//! [`MultiSource`] is the composite resolver. [`StickyTable`] and
//! [`KeyedCell`] are the concurrent caches it and the stores rely on.

pub mod keyed_cell;
pub mod multi_source;
pub mod sticky;

pub use keyed_cell::KeyedCell;
pub use multi_source::{MultiSession, MultiSource, MultiSourceBuilder};
pub use sticky::StickyTable;
