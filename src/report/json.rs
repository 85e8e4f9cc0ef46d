//! JSON output for snapshot listings.
//!
//! Serializes the listing as an array of descriptors for scripting.

use crate::store::SnapshotDescriptor;

pub fn render(listing: &[SnapshotDescriptor]) -> String {
    serde_json::to_string_pretty(listing).unwrap_or_else(|_| String::from("[]"))
}
