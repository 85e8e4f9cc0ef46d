use std::fs::{self, OpenOptions};
use std::process;

use clap::Parser;
use hyprsession::builder::SnapshotBuilder;
use hyprsession::cli::{self, Action, Cli};
use hyprsession::config::Config;
use hyprsession::report;
use hyprsession::restore::{self, CommandLauncher};
use hyprsession::store::{Selector, SnapshotStore};
use hyprsession::{logging, platform, Result};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool, interactive: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = logging::filter(verbose, rust_log.as_deref());

    // the picker owns the terminal, so its logs go to a file
    if interactive {
        let log_file = platform::log_file().and_then(|path| {
            fs::create_dir_all(path.parent()?).ok()?;
            OpenOptions::new().create(true).append(true).open(path).ok()
        });

        if let Some(file) = log_file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn restore_latest(store: &SnapshotStore, launcher: &CommandLauncher) -> Result<i32> {
    let latest = store.resolve(&Selector::Latest)?;
    let report = restore::restore(store, &latest.filename, launcher)?;
    println!("Restored {} ({} applications)", latest.label, report.dispatched);
    Ok(0)
}

fn ask_restore_latest(store: &SnapshotStore, launcher: &CommandLauncher) -> Result<i32> {
    let Some(latest) = store.latest()? else {
        eprintln!("No cached session files found in:\n{}", store.dir().display());
        return Ok(1);
    };

    let question = format!(
        "Do you want to restore your latest session?\n\n{}\n",
        store.path_for(&latest.filename).display()
    );
    let accepted = cli::confirm(&question, true).unwrap_or(false);
    if !accepted {
        return Ok(1);
    }

    let report = restore::restore(store, &latest.filename, launcher)?;
    println!("Restored {} ({} applications)", latest.label, report.dispatched);
    Ok(0)
}

fn run(action: Action, config: &Config) -> Result<i32> {
    let store = SnapshotStore::from_config(config);
    let launcher = CommandLauncher::from_config(config);

    match action {
        Action::NewCache => {
            let created = SnapshotBuilder::from_config(config).build(&store)?;
            println!("New session cached as:\n{}", store.path_for(&created.filename).display());
            Ok(0)
        }
        Action::RestoreLatest => restore_latest(&store, &launcher),
        Action::AskRestoreLatest => ask_restore_latest(&store, &launcher),
        Action::List { json } => {
            report::print(&store.list()?, json);
            Ok(0)
        }
        Action::Restore(selector) => {
            let target = store.resolve(&selector)?;
            let report = restore::restore(&store, &target.filename, &launcher)?;
            println!("Restored {} ({} applications)", target.label, report.dispatched);
            Ok(0)
        }
        Action::Remove(selector) => {
            let target = store.resolve(&selector)?;
            store.remove(&target.filename)?;
            println!("Removed {}", target.label);
            Ok(0)
        }
        Action::Interactive => interactive(config, &store),
    }
}

#[cfg(feature = "tui")]
fn interactive(config: &Config, _store: &SnapshotStore) -> Result<i32> {
    hyprsession::tui::run(config)?;
    Ok(0)
}

#[cfg(not(feature = "tui"))]
fn interactive(_config: &Config, store: &SnapshotStore) -> Result<i32> {
    report::print(&store.list()?, false);
    Ok(0)
}

fn main() {
    let cli = Cli::parse();
    let action = cli.action();

    init_logging(cli.verbose, action == Action::Interactive && cfg!(feature = "tui"));

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let code = match run(action, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };

    process::exit(code);
}
