pub mod table;
pub mod json;

use crate::store::SnapshotDescriptor;

pub fn print(listing: &[SnapshotDescriptor], json_output: bool) {
    if json_output {
        println!("{}", json::render(listing));
    } else {
        print!("{}", table::render(listing));
    }
}
