use std::path::PathBuf;

use directories::BaseDirs;

pub const APP_DIR: &str = "hyprsession";

/// System-wide desktop entries, checked after the user's own.
pub const SYSTEM_APPLICATIONS_DIR: &str = "/usr/share/applications";

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
}

/// Where records live (~/.cache/hyprsession on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.cache_dir().join(APP_DIR))
}

/// ~/.config/hyprsession/config.toml or platform equivalent
pub fn config_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR).join("config.toml"))
}

/// ~/.local/share/applications on Linux
pub fn user_applications_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.data_local_dir().join("applications"))
}

/// Desktop-entry search roots, user first.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(user) = user_applications_dir() {
        paths.push(user);
    }
    paths.push(PathBuf::from(SYSTEM_APPLICATIONS_DIR));
    paths
}

/// Log file for the interactive picker, which owns the terminal.
pub fn log_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.cache_dir())
            .join(APP_DIR)
            .join("hyprsession.log")
    })
}
