//! Filesystem adapters.

mod local;

pub use local::FileSystemSource;
