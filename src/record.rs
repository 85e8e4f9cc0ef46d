//! On-disk record format.
//!
//! A record is plain UTF-8 text: one absolute desktop-entry path per line,
//! no header and no trailing metadata. Entries are stored verbatim. Blank
//! entries are never written and are skipped on read, and an entry may not
//! contain a line break.

use std::io::{self, BufRead, Write};
use std::path::Path;

/// Rejects entries that would not survive the one-per-line format.
pub fn validate_entries(entries: &[String]) -> io::Result<()> {
    match entries.iter().find(|e| e.contains(['\n', '\r'])) {
        Some(bad) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("entry contains a line break: {bad:?}"),
        )),
        None => Ok(()),
    }
}

pub fn write_entries<W: Write>(mut out: W, entries: &[String]) -> io::Result<()> {
    validate_entries(entries)?;

    for entry in entries {
        if entry.trim().is_empty() {
            continue;
        }
        writeln!(out, "{entry}")?;
    }
    out.flush()
}

pub fn read_entries<R: BufRead>(input: R) -> io::Result<Vec<String>> {
    let mut entries = Vec::new();

    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            entries.push(line);
        }
    }

    Ok(entries)
}

/// Desktop-entry id for a record line: the final path component.
pub fn desktop_id(entry: &str) -> Option<&str> {
    Path::new(entry).file_name().and_then(|n| n.to_str())
}
