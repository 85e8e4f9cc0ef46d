use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::store::Selector;

#[derive(Parser, Debug)]
#[command(name = "hyprsession")]
#[command(about = "Snapshot the running desktop applications and relaunch them later")]
#[command(version)]
pub struct Cli {
    /// Snapshot the running applications, then exit
    #[arg(long, group = "action")]
    pub new_cache: bool,

    /// Relaunch the applications of the most recent snapshot, then exit
    #[arg(long, group = "action")]
    pub restore_latest: bool,

    /// Ask before restoring the most recent snapshot; exits 1 on "no"
    #[arg(long, group = "action")]
    pub ask_restore_latest: bool,

    /// Print the cached snapshots, newest first
    #[arg(long, group = "action")]
    pub list: bool,

    /// Restore a snapshot by filename or list position (0 = newest)
    #[arg(long, group = "action", value_name = "NAME|POSITION")]
    pub restore: Option<Selector>,

    /// Remove a snapshot by filename or list position
    #[arg(long, group = "action", value_name = "NAME|POSITION")]
    pub remove: Option<Selector>,

    /// Output the listing as JSON
    #[arg(long, requires = "list", default_value_t = false)]
    pub json: bool,

    /// Directory holding snapshot records
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.config/hyprsession/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Time limit for querying running applications, e.g. "5s"
    #[arg(long)]
    pub timeout: Option<String>,

    /// Show debug logging
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NewCache,
    RestoreLatest,
    AskRestoreLatest,
    List { json: bool },
    Restore(Selector),
    Remove(Selector),
    /// no action flag given
    Interactive,
}

impl Cli {
    pub fn action(&self) -> Action {
        if self.new_cache {
            Action::NewCache
        } else if self.restore_latest {
            Action::RestoreLatest
        } else if self.ask_restore_latest {
            Action::AskRestoreLatest
        } else if self.list {
            Action::List { json: self.json }
        } else if let Some(sel) = &self.restore {
            Action::Restore(sel.clone())
        } else if let Some(sel) = &self.remove {
            Action::Remove(sel.clone())
        } else {
            Action::Interactive
        }
    }
}

/// Interprets a yes/no answer. Empty input picks the default.
pub fn parse_answer(line: &str, default_yes: bool) -> bool {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}

/// Prompts on stderr and reads one line from stdin. EOF counts as "no".
pub fn confirm(question: &str, default_yes: bool) -> io::Result<bool> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    let mut stderr = io::stderr();
    write!(stderr, "{question} {hint} ")?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(parse_answer(&line, default_yes))
}
