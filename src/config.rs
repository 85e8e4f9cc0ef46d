use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::platform;

pub const DEFAULT_MAX_SESSIONS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LAUNCHER: &str = "gtk-launch";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub max_sessions: usize,
    pub timeout: Duration,
    pub launcher: String,
    pub search_paths: Vec<PathBuf>,
}

/// Shape of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    cache_dir: Option<PathBuf>,
    max_sessions: Option<usize>,
    timeout: Option<String>,
    launcher: Option<String>,
    search_paths: Option<Vec<PathBuf>>,
}

impl Default for Config {
    fn default() -> Self {
        let cache_dir = platform::cache_dir()
            .or_else(|| platform::home_dir().map(|h| h.join(".cache").join(platform::APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".cache").join(platform::APP_DIR));

        Config {
            cache_dir,
            max_sessions: DEFAULT_MAX_SESSIONS,
            timeout: DEFAULT_TIMEOUT,
            launcher: DEFAULT_LAUNCHER.to_string(),
            search_paths: platform::default_search_paths(),
        }
    }
}

impl Config {
    /// Defaults, then the user's config file (if any), then command line flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().or_else(platform::config_file);

        let mut config = match path {
            Some(p) if p.is_file() => Config::default().merge_file(&p)?,
            Some(p) if cli.config.is_some() => {
                return Err(Error::Config(format!("{} does not exist", p.display())));
            }
            _ => Config::default(),
        };

        if let Some(dir) = &cli.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(timeout) = &cli.timeout {
            config.timeout = parse_timeout(timeout)?;
        }

        Ok(config)
    }

    pub fn merge_file(self, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.merge_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn merge_toml(mut self, text: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;

        if let Some(dir) = file.cache_dir {
            self.cache_dir = dir;
        }
        if let Some(max) = file.max_sessions {
            if max == 0 {
                return Err(Error::Config("max_sessions must be at least 1".to_string()));
            }
            self.max_sessions = max;
        }
        if let Some(timeout) = file.timeout {
            self.timeout = parse_timeout(&timeout)?;
        }
        if let Some(launcher) = file.launcher {
            self.launcher = launcher;
        }
        if let Some(paths) = file.search_paths {
            self.search_paths = paths;
        }

        Ok(self)
    }
}

pub fn parse_timeout(s: &str) -> Result<Duration> {
    humantime::parse_duration(s.trim())
        .map_err(|e| Error::Config(format!("timeout {s:?}: {e}")))
}
