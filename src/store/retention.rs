//! Retention cap enforcement.
//!
//! Runs lazily whenever the store is listed. Deletion is best effort per
//! file: a record that cannot be removed (or was already removed by another
//! instance) is logged and the pass continues.

use std::fs;

use tracing::warn;

use super::RecordFile;

/// Deletes every record past `cap`. `files` must already be sorted newest
/// first. Returns how many files were actually removed.
pub(crate) fn evict(files: &[RecordFile], cap: usize) -> usize {
    let mut removed = 0;

    for file in files.iter().skip(cap) {
        match fs::remove_file(&file.path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("failed to remove session file {}: {e}", file.name),
        }
    }

    removed
}
