//! Interactive snapshot picker.
//!
//! Lists the cached sessions and drives the same operations as the flags:
//! restore selected, restore latest, remove selected, new snapshot.
//! Every operation reports back through a single status line.

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, List, ListItem, ListState, Paragraph},
    DefaultTerminal, Frame,
};

use crate::builder::SnapshotBuilder;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::restore::{self, CommandLauncher, Launcher};
use crate::store::{SnapshotDescriptor, SnapshotStore};

const HELP: &str = "enter restore  l latest  n new  d remove  j/k move  q quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    ConfirmRestoreLatest(SnapshotDescriptor),
    ConfirmRemove(SnapshotDescriptor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Picker {
    store: SnapshotStore,
    builder: SnapshotBuilder,
    launcher: Box<dyn Launcher>,
    items: Vec<SnapshotDescriptor>,
    list_state: ListState,
    mode: Mode,
    status: String,
}

impl Picker {
    pub fn new(store: SnapshotStore, builder: SnapshotBuilder, launcher: Box<dyn Launcher>) -> Self {
        let mut picker = Picker {
            store,
            builder,
            launcher,
            items: Vec::new(),
            list_state: ListState::default(),
            mode: Mode::Browse,
            status: String::new(),
        };
        picker.refresh();
        picker
    }

    pub fn from_config(config: &Config) -> Self {
        Picker::new(
            SnapshotStore::from_config(config),
            SnapshotBuilder::from_config(config),
            Box::new(CommandLauncher::from_config(config)),
        )
    }

    /// Re-list the store (which also applies retention) and keep the
    /// selection in range.
    fn refresh(&mut self) {
        match self.store.list() {
            Ok(items) => self.items = items,
            Err(e) => {
                self.items.clear();
                self.status = format!("Failed to list sessions: {e}");
            }
        }

        let selected = match (self.list_state.selected(), self.items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.list_state.select(selected);
    }

    fn selected(&self) -> Option<SnapshotDescriptor> {
        self.list_state.selected().and_then(|i| self.items.get(i)).cloned()
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => return self.handle_browse_key(code),
            Mode::ConfirmRestoreLatest(latest) => match code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.restore(&latest),
                _ => self.status = String::from("Restore cancelled."),
            },
            Mode::ConfirmRemove(target) => match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.remove(&target),
                _ => self.status = String::from("Remove cancelled."),
            },
        }
        Flow::Continue
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> Flow {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Enter => match self.selected() {
                Some(target) => self.restore(&target),
                None => self.status = String::from("Please select a session to restore."),
            },
            KeyCode::Char('l') => match self.store.latest() {
                Ok(Some(latest)) => {
                    self.status = format!("Restore latest session {}? [Y/n]", latest.filename);
                    self.mode = Mode::ConfirmRestoreLatest(latest);
                }
                Ok(None) => self.status = String::from("No cached sessions found to restore."),
                Err(e) => self.status = format!("Failed to find latest session: {e}"),
            },
            KeyCode::Char('d') => match self.selected() {
                Some(target) => {
                    self.status = format!("Remove session {}? [y/N]", target.label);
                    self.mode = Mode::ConfirmRemove(target);
                }
                None => self.status = String::from("Please select a session to remove."),
            },
            KeyCode::Char('n') => self.new_cache(),
            _ => {}
        }
        Flow::Continue
    }

    fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.list_state.select(Some(next));
    }

    fn restore(&mut self, target: &SnapshotDescriptor) {
        self.status = match restore::restore(&self.store, &target.filename, self.launcher.as_ref()) {
            Ok(report) => format!("Restored {} ({} applications).", target.label, report.dispatched),
            Err(e) => format!("Failed to restore session {}: {e}", target.label),
        };
    }

    fn remove(&mut self, target: &SnapshotDescriptor) {
        self.status = match self.store.remove(&target.filename) {
            Ok(()) => format!("Removed {}.", target.label),
            Err(e) => format!("Failed to remove session {}: {e}", target.label),
        };
        self.refresh();
    }

    fn new_cache(&mut self) {
        match self.builder.build(&self.store) {
            Ok(created) => {
                self.refresh();
                self.list_state.select(Some(0));
                self.status = format!("New session cached as {}.", created.filename);
            }
            Err(e) => self.status = format!("Cache creation failed: {e}"),
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [list_area, status_area, help_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let items: Vec<ListItem> = if self.items.is_empty() {
            vec![ListItem::new(Line::styled(
                "no cached sessions, press n to create one",
                Style::new().fg(Color::DarkGray),
            ))]
        } else {
            self.items
                .iter()
                .map(|d| ListItem::new(d.label.clone()))
                .collect()
        };

        let list = List::new(items)
            .block(Block::bordered().title(format!(
                " Sessions {}/{} ",
                self.items.len(),
                self.store.max_sessions()
            )))
            .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut self.list_state);
        frame.render_widget(Paragraph::new(self.status.as_str()), status_area);
        frame.render_widget(
            Paragraph::new(HELP).style(Style::new().fg(Color::DarkGray)),
            help_area,
        );
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame)).map_err(Error::Terminal)?;

            if let Event::Key(key) = event::read().map_err(Error::Terminal)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if self.handle_key(key.code) == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}

pub fn run(config: &Config) -> Result<()> {
    let mut picker = Picker::from_config(config);

    let mut terminal = ratatui::init();
    let result = picker.event_loop(&mut terminal);
    ratatui::restore();

    result
}
