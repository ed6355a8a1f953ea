//! IO-heavy reader for the binout finite-element result archive format:
//! header parsing, the per-shard record stream, shard-pattern expansion,
//! and the [`Archive`] opener/typed-reader/query API built on top of them.

pub mod archive;
pub mod glob_expand;
pub mod header;
pub mod reader;
pub mod stream;

pub use archive::Archive;
pub use binout_core::errors::{BinoutError, Result};

/// Open every shard matching `pattern` and return the resulting archive.
/// Thin convenience wrapper around [`Archive::open`].
pub fn open(pattern: &str) -> Result<Archive> {
    Archive::open(pattern)
}
