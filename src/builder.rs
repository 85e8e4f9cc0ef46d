//! Snapshot builder.
//!
//! Asks the compositor which application classes currently have windows,
//! maps each class to a desktop entry, and writes the result as a new record:
//! - Classes come from `hyprctl clients -j` (`initialClass` of every client)
//! - Desktop entries are looked up in the user's applications dir first,
//!   then the system one; unresolved classes are dropped
//! - The manager's own class is never recorded
//!
//! The query and resolution share one deadline. Missing it writes nothing.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{SnapshotDescriptor, SnapshotStore};

/// Window class of this tool. Restoring a session must not relaunch it.
pub const SELF_CLASS: &str = "hyprsessionmanager";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of currently running application classes.
pub trait ClassSource {
    fn name(&self) -> &str;
    /// Distinct classes in byte order. Must give up once `timeout` passes.
    fn classes(&self, timeout: Duration) -> Result<Vec<String>>;
}

pub struct HyprctlSource {
    program: String,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HyprClient {
    #[serde(rename = "initialClass", default)]
    initial_class: Option<String>,
}

impl Default for HyprctlSource {
    fn default() -> Self {
        HyprctlSource::with_command("hyprctl", ["clients", "-j"])
    }
}

impl HyprctlSource {
    /// Any command that prints a `hyprctl clients -j` style JSON array.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HyprctlSource {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClassSource for HyprctlSource {
    fn name(&self) -> &str {
        &self.program
    }

    fn classes(&self, timeout: Duration) -> Result<Vec<String>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Build(format!("failed to run {}: {e}", self.program)))?;

        // drain pipes on the side so a chatty child can't block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::Timeout(timeout));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(Error::Build(format!("failed to wait for {}: {e}", self.program)));
                }
            }
        };

        // a backgrounded grandchild can hold the pipes open past the exit
        let remaining = |start: Instant| timeout.saturating_sub(start.elapsed());
        let stdout = stdout
            .recv_timeout(remaining(start))
            .map_err(|_| Error::Timeout(timeout))?;
        let stderr = stderr.recv_timeout(remaining(start)).unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(Error::Build(format!(
                "{} exited with status {}: {}",
                self.program,
                status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        parse_clients(&stdout)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn parse_clients(json: &[u8]) -> Result<Vec<String>> {
    let clients: Vec<HyprClient> = serde_json::from_slice(json)
        .map_err(|e| Error::Build(format!("failed to parse client list: {e}")))?;

    let classes: BTreeSet<String> = clients
        .into_iter()
        .filter_map(|c| c.initial_class)
        .collect();

    Ok(classes.into_iter().collect())
}

/// Finds `<class>.desktop` in an ordered list of directories; first hit wins.
#[derive(Debug, Clone)]
pub struct DesktopEntryResolver {
    search_paths: Vec<PathBuf>,
}

impl DesktopEntryResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        DesktopEntryResolver { search_paths }
    }

    pub fn from_config(config: &Config) -> Self {
        DesktopEntryResolver::new(config.search_paths.clone())
    }

    pub fn resolve(&self, class: &str) -> Option<PathBuf> {
        if class.is_empty() || class.contains('/') {
            return None;
        }

        let filename = format!("{class}.desktop");
        self.search_paths
            .iter()
            .map(|root| root.join(&filename))
            .find(|candidate| candidate.is_file())
    }
}

pub struct SnapshotBuilder {
    source: Box<dyn ClassSource>,
    resolver: DesktopEntryResolver,
    timeout: Duration,
}

impl SnapshotBuilder {
    pub fn new(source: Box<dyn ClassSource>, resolver: DesktopEntryResolver, timeout: Duration) -> Self {
        SnapshotBuilder {
            source,
            resolver,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        SnapshotBuilder::new(
            Box::new(HyprctlSource::default()),
            DesktopEntryResolver::from_config(config),
            config.timeout,
        )
    }

    /// Desktop-entry paths for the running applications, in class order.
    pub fn collect_entries(&self) -> Result<Vec<String>> {
        let start = Instant::now();
        let classes = self.source.classes(self.timeout)?;
        debug!(source = self.source.name(), count = classes.len(), "queried application classes");

        if start.elapsed() > self.timeout {
            return Err(Error::Timeout(self.timeout));
        }

        let mut entries = Vec::new();
        for class in &classes {
            if class.is_empty() || class == SELF_CLASS {
                continue;
            }

            match self.resolver.resolve(class) {
                Some(path) => entries.push(path.to_string_lossy().into_owned()),
                None => debug!(class = %class, "no desktop entry, skipping"),
            }

            if start.elapsed() > self.timeout {
                return Err(Error::Timeout(self.timeout));
            }
        }

        Ok(entries)
    }

    pub fn build(&self, store: &SnapshotStore) -> Result<SnapshotDescriptor> {
        let entries = self.collect_entries()?;
        store.create(&entries)
    }
}
