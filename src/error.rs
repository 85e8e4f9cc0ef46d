use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("timed out after {}", human(.0))]
    Timeout(Duration),
    #[error("failed to create new cache session: {0}")]
    Build(String),
    #[error("invalid timestamp: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("terminal: {0}")]
    Terminal(#[source] std::io::Error),
}

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
