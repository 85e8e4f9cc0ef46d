//! Plain-text table for snapshot listings.
//!
//! One row per record, newest first, with its list position so it can be
//! passed back to `--restore` or `--remove`.

use crate::store::SnapshotDescriptor;

pub fn render(listing: &[SnapshotDescriptor]) -> String {
    if listing.is_empty() {
        return String::from("No cached sessions. Run 'hyprsession --new-cache' to create one.\n");
    }

    let mut output = String::new();
    output.push_str(&format!("{:<4} {:<22} {}\n", "#", "Date", "File"));
    output.push_str(&"-".repeat(52));
    output.push('\n');

    for (position, snapshot) in listing.iter().enumerate() {
        output.push_str(&format!(
            "{:<4} {:<22} {}\n",
            position,
            truncate(&snapshot.label, 22),
            snapshot.filename
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
