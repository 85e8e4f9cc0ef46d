//! Restoration engine.
//!
//! Replays a record by starting one detached launcher process per entry.
//! Launches are fire-and-forget: nothing waits on them and their exit status
//! is never observed, so a restore only fails when the record can't be read.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::record;
use crate::store::SnapshotStore;

/// Starts an application by desktop-entry id (`firefox.desktop`).
pub trait Launcher {
    fn launch(&self, desktop_id: &str);
}

/// Runs `<program> <desktop-id>` detached. The child handle is dropped
/// immediately; it is never waited on.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLauncher {
            program: program.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        CommandLauncher::new(&config.launcher)
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, desktop_id: &str) {
        let spawned = Command::new(&self.program)
            .arg(desktop_id)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => debug!(id = desktop_id, pid = child.id(), "launched"),
            Err(e) => warn!("failed to run {} {desktop_id}: {e}", self.program),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    Reading,
    /// launches issued so far
    Dispatching(usize),
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub filename: String,
    pub dispatched: usize,
}

/// One restore invocation. No retry and no rollback: once a launch is
/// dispatched it stays dispatched.
pub struct Restoration<'a, L: Launcher + ?Sized> {
    launcher: &'a L,
    state: RestoreState,
}

impl<'a, L: Launcher + ?Sized> Restoration<'a, L> {
    pub fn new(launcher: &'a L) -> Self {
        Restoration {
            launcher,
            state: RestoreState::Idle,
        }
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    pub fn run(&mut self, store: &SnapshotStore, filename: &str) -> Result<RestoreReport> {
        self.state = RestoreState::Reading;

        let entries = match store.read(filename) {
            Ok(entries) => entries,
            Err(e) => {
                self.state = RestoreState::Failed;
                return Err(e);
            }
        };

        let mut dispatched = 0;
        self.state = RestoreState::Dispatching(0);
        for entry in &entries {
            let Some(id) = record::desktop_id(entry.trim()) else {
                continue;
            };
            self.launcher.launch(id);
            dispatched += 1;
            self.state = RestoreState::Dispatching(dispatched);
        }

        self.state = RestoreState::Done;
        debug!(file = filename, dispatched, "restore finished");

        Ok(RestoreReport {
            filename: filename.to_string(),
            dispatched,
        })
    }
}

pub fn restore<L: Launcher + ?Sized>(
    store: &SnapshotStore,
    filename: &str,
    launcher: &L,
) -> Result<RestoreReport> {
    Restoration::new(launcher).run(store, filename)
}
