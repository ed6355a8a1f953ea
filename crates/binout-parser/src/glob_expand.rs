//! Pattern expansion is deliberately delegated to the `glob` crate (§4.4
//! step 1): this is the "external collaborator" the design calls out, so
//! this module is a thin, sorted wrapper rather than a hand-rolled matcher.

use binout_core::errors::{BinoutError, Result};
use std::path::PathBuf;

/// Expand `pattern` into the sorted list of matching physical files.
/// Paths the OS refuses to stat during iteration are silently skipped —
/// only a successful `open()` later turns into a per-file error.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect();

    if paths.is_empty() {
        return Err(BinoutError::NoShardsMatched {
            pattern: pattern.to_string(),
        });
    }

    paths.sort();
    Ok(paths)
}
