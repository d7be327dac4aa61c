//! Infrastructure adapters for tplres.
//!
//! This crate implements the `Source` port defined in
//! `tplres_core::application::ports`. It contains all I/O.

pub mod filesystem;
pub mod memory;

// Re-export commonly used adapters
pub use filesystem::FileSystemSource;
pub use memory::{ByteSource, MemorySource, MemoryValue, StringSource};
