//! Snapshot identity tokens.
//!
//! A token is the local wall-clock second a snapshot was taken, formatted as
//! `YYYYMMdd-HHmmss`. Tokens sort lexicographically in chronological order,
//! but the store never relies on that: ordering always comes from mtime.
//! Decoding exists only to render a friendlier label.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::store::RECORD_PREFIX;

const TOKEN_FORMAT: &str = "%Y%m%d-%H%M%S";
const LABEL_FORMAT: &str = "%-d %b %Y [%H:%M]";
const TOKEN_LEN: usize = 15;

pub fn encode(instant: &NaiveDateTime) -> String {
    instant.format(TOKEN_FORMAT).to_string()
}

pub fn decode(token: &str) -> Result<NaiveDateTime> {
    // chrono accepts short numeric fields, so check the shape first
    let well_formed = token.len() == TOKEN_LEN
        && token.bytes().enumerate().all(|(i, b)| {
            if i == 8 {
                b == b'-'
            } else {
                b.is_ascii_digit()
            }
        });

    if !well_formed {
        return Err(Error::Parse(token.to_string()));
    }

    NaiveDateTime::parse_from_str(token, TOKEN_FORMAT)
        .map_err(|e| Error::Parse(format!("{token}: {e}")))
}

/// Human label for a record filename, e.g. `3 Jan 2024 [14:05]`.
/// Falls back to the raw filename when the token does not decode.
pub fn display_label(filename: &str) -> String {
    let token = filename.strip_prefix(RECORD_PREFIX).unwrap_or(filename);

    match decode(token) {
        Ok(dt) => dt.format(LABEL_FORMAT).to_string(),
        Err(_) => filename.to_string(),
    }
}
