pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod record;
pub mod report;
pub mod restore;
pub mod store;
pub mod timestamp;
#[cfg(feature = "tui")]
pub mod tui;

pub use error::{Error, Result};
