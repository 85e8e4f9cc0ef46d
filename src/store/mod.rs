//! Snapshot record storage.
//!
//! Records are plain files named `session-<token>` in a single directory.
//! Supports:
//! - Listing records newest first (by mtime), trimming to the retention cap
//! - Creating a record atomically from a list of desktop-entry paths
//! - Removing a record by filename
//! - Selecting a record by position, name, or recency
//!
//! The directory is created on first use.

mod retention;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record;
use crate::timestamp;

pub const RECORD_PREFIX: &str = "session-";

/// One listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDescriptor {
    pub filename: String,
    pub label: String,
    /// mtime in unix seconds
    pub modified: i64,
}

/// How a caller picks a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Latest,
    /// 0-based position in `list()` order
    Position(usize),
    Name(String),
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == "latest" {
            return Ok(Selector::Latest);
        }
        Ok(match s.parse::<usize>() {
            Ok(n) => Selector::Position(n),
            Err(_) => Selector::Name(s.to_string()),
        })
    }
}

/// A record file found on disk.
#[derive(Debug, Clone)]
pub(crate) struct RecordFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl RecordFile {
    fn describe(&self) -> SnapshotDescriptor {
        SnapshotDescriptor {
            filename: self.name.clone(),
            label: timestamp::display_label(&self.name),
            modified: unix_seconds(self.modified),
        }
    }
}

/// Handle to the record directory. Cheap to construct, holds no open files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    max_sessions: usize,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, max_sessions: usize) -> Self {
        SnapshotStore {
            dir: dir.into(),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        SnapshotStore::new(&config.cache_dir, config.max_sessions)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Records newest first. Deletes everything past the retention cap
    /// before returning.
    pub fn list(&self) -> Result<Vec<SnapshotDescriptor>> {
        self.ensure_dir()?;

        let mut files = self.scan()?;
        if files.len() > self.max_sessions {
            let removed = retention::evict(&files, self.max_sessions);
            debug!(removed, cap = self.max_sessions, "retention pass");
            files = self.scan()?;
        }

        Ok(files
            .iter()
            .take(self.max_sessions)
            .map(RecordFile::describe)
            .collect())
    }

    /// Write a new record stamped with the current local time.
    pub fn create(&self, entries: &[String]) -> Result<SnapshotDescriptor> {
        self.create_at(entries, &Local::now().naive_local())
    }

    pub fn create_at(&self, entries: &[String], instant: &NaiveDateTime) -> Result<SnapshotDescriptor> {
        record::validate_entries(entries).map_err(|e| Error::io(&self.dir, e))?;
        self.ensure_dir()?;

        let filename = format!("{RECORD_PREFIX}{}", timestamp::encode(instant));
        let path = self.path_for(&filename);

        // temp file lives in the same directory so persist() is a rename
        let mut tmp = tempfile::Builder::new()
            .prefix(".session-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::io(&self.dir, e))?;

        record::write_entries(BufWriter::new(tmp.as_file_mut()), entries)
            .map_err(|e| Error::io(tmp.path(), e))?;

        tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| Error::io(&path, e))?;

        debug!(file = %filename, entries = entries.len(), "created session record");

        if let Err(e) = self.list() {
            warn!("retention after create failed: {e}");
        }

        Ok(RecordFile {
            name: filename,
            path,
            modified,
        }
        .describe())
    }

    pub fn remove(&self, filename: &str) -> Result<()> {
        if !is_record_name(filename) {
            return Err(Error::NotFound(filename.to_string()));
        }

        let path = self.path_for(filename);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = filename, "removed session record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(filename.to_string()))
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Entries of a record, in the order they were written.
    pub fn read(&self, filename: &str) -> Result<Vec<String>> {
        if !is_record_name(filename) {
            return Err(Error::NotFound(filename.to_string()));
        }

        let path = self.path_for(filename);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(filename.to_string()));
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        record::read_entries(BufReader::new(file)).map_err(|e| Error::io(path, e))
    }

    /// Most recently modified record. No eviction.
    pub fn latest(&self) -> Result<Option<SnapshotDescriptor>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }
        Ok(self.scan()?.first().map(RecordFile::describe))
    }

    pub fn resolve(&self, selector: &Selector) -> Result<SnapshotDescriptor> {
        match selector {
            Selector::Latest => self
                .latest()?
                .ok_or_else(|| Error::NotFound(format!("no cached sessions in {}", self.dir.display()))),
            Selector::Position(n) => self
                .list()?
                .into_iter()
                .nth(*n)
                .ok_or_else(|| Error::NotFound(format!("#{n}"))),
            Selector::Name(name) => {
                if !is_record_name(name) {
                    return Err(Error::NotFound(name.clone()));
                }
                let path = self.path_for(name);
                match fs::metadata(&path) {
                    Ok(meta) if meta.is_file() => {
                        let modified = meta.modified().map_err(|e| Error::io(&path, e))?;
                        Ok(RecordFile {
                            name: name.clone(),
                            path,
                            modified,
                        }
                        .describe())
                    }
                    _ => Err(Error::NotFound(name.clone())),
                }
            }
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    /// Record files sorted by mtime descending, ties by name descending.
    fn scan(&self) -> Result<Vec<RecordFile>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let mut files = Vec::new();

        for entry in read_dir {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(RECORD_PREFIX) {
                continue;
            }

            let path = entry.path();
            // follows symlinks; a record can vanish between readdir and stat
            let modified = match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => match meta.modified() {
                    Ok(t) => t,
                    Err(_) => continue,
                },
                Ok(_) => continue,
                Err(e) => {
                    debug!(file = %name, "skipping unreadable record: {e}");
                    continue;
                }
            };

            files.push(RecordFile { name, path, modified });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        Ok(files)
    }
}

/// A bare filename carrying the record prefix.
pub fn is_record_name(name: &str) -> bool {
    name.starts_with(RECORD_PREFIX)
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
}

fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn touch(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("latest".parse::<Selector>().unwrap(), Selector::Latest);
        assert_eq!("2".parse::<Selector>().unwrap(), Selector::Position(2));
        assert_eq!(
            "session-20240103-140509".parse::<Selector>().unwrap(),
            Selector::Name("session-20240103-140509".to_string())
        );
    }

    #[test]
    fn record_names() {
        assert!(is_record_name("session-20240103-140509"));
        assert!(!is_record_name("notes.txt"));
        assert!(!is_record_name("session-x/../../etc/passwd"));
    }

    #[test]
    fn path_for_is_a_plain_join() {
        let store = SnapshotStore::new("/tmp/does-not-exist", 5);
        assert_eq!(
            store.path_for("session-20240103-140509"),
            PathBuf::from("/tmp/does-not-exist/session-20240103-140509")
        );
    }

    #[test]
    fn list_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("cache");
        let store = SnapshotStore::new(&dir, 5);

        assert!(store.list().unwrap().is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn create_then_read_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        let entries = owned(&[
            "/usr/share/applications/firefox.desktop",
            "",
            "/home/u/.local/share/applications/kitty.desktop",
            "/usr/share/applications/firefox.desktop",
        ]);

        let desc = store.create_at(&entries, &at(14, 5, 9)).unwrap();
        assert_eq!(desc.filename, "session-20240103-140509");
        assert_eq!(desc.label, "3 Jan 2024 [14:05]");

        let back = store.read(&desc.filename).unwrap();
        assert_eq!(
            back,
            owned(&[
                "/usr/share/applications/firefox.desktop",
                "/home/u/.local/share/applications/kitty.desktop",
                "/usr/share/applications/firefox.desktop",
            ])
        );
    }

    #[test]
    fn create_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        store.create_at(&owned(&["/a/x.desktop"]), &at(9, 0, 0)).unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["session-20240103-090000".to_string()]);
    }

    #[test]
    fn same_second_create_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);

        store.create_at(&owned(&["/a/first.desktop"]), &at(9, 0, 0)).unwrap();
        store.create_at(&owned(&["/a/second.desktop"]), &at(9, 0, 0)).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(
            store.read("session-20240103-090000").unwrap(),
            owned(&["/a/second.desktop"])
        );
    }

    #[test]
    fn create_fails_when_directory_cannot_exist() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "").unwrap();

        let store = SnapshotStore::new(blocker.join("cache"), 5);
        let err = store.create_at(&owned(&["/a/x.desktop"]), &at(9, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn list_orders_by_mtime_not_name() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);

        let old_name = store.create_at(&owned(&["/a"]), &at(23, 0, 0)).unwrap().filename;
        let new_name = store.create_at(&owned(&["/b"]), &at(1, 0, 0)).unwrap().filename;
        touch(&store.path_for(&old_name), 1_000);
        touch(&store.path_for(&new_name), 2_000);

        let names: Vec<_> = store.list().unwrap().into_iter().map(|d| d.filename).collect();
        assert_eq!(names, vec![new_name, old_name]);
    }

    #[test]
    fn list_ignores_foreign_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(tmp.path().join("session-dir")).unwrap();
        fs::write(tmp.path().join("session-20240103-090000"), "/a\n").unwrap();

        let store = SnapshotStore::new(tmp.path(), 5);
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "session-20240103-090000");
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[test]
    fn remove_missing_record_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        store.create_at(&owned(&["/a"]), &at(9, 0, 0)).unwrap();

        let err = store.remove("session-20000101-000000").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn remove_rejects_paths_outside_store() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("keep.txt");
        fs::write(&outside, "x").unwrap();

        let store = SnapshotStore::new(tmp.path().join("cache"), 5);
        assert!(matches!(store.remove("../keep.txt"), Err(Error::NotFound(_))));
        assert!(outside.exists());
    }

    #[test]
    fn remove_deletes_record() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        let desc = store.create_at(&owned(&["/a"]), &at(9, 0, 0)).unwrap();

        store.remove(&desc.filename).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_keeps_entries_verbatim() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        let entries = owned(&["/apps/a b.desktop ", "/apps/c.desktop"]);

        let desc = store.create_at(&entries, &at(9, 0, 0)).unwrap();
        assert_eq!(store.read(&desc.filename).unwrap(), entries);
    }

    #[test]
    fn create_rejects_multiline_entry_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("cache");
        let store = SnapshotStore::new(&dir, 5);

        let err = store
            .create_at(&owned(&["/apps/a b.desktop ", "/apps/x\n/apps/y.desktop"]), &at(9, 0, 0))
            .unwrap_err();
        match err {
            Error::Io { source, .. } => assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput),
            other => panic!("expected io error, got {other:?}"),
        }
        assert!(!dir.exists());
    }

    #[test]
    fn read_outside_store_is_not_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("secret"), "/a/x.desktop\n").unwrap();

        let store = SnapshotStore::new(tmp.path().join("cache"), 5);
        assert!(matches!(store.read("../secret"), Err(Error::NotFound(_))));
        assert!(matches!(store.read("secret"), Err(Error::NotFound(_))));
    }

    #[test]
    fn cap_is_at_least_one() {
        assert_eq!(SnapshotStore::new("/tmp", 0).max_sessions(), 1);
        assert_eq!(SnapshotStore::new("/tmp", 5).max_sessions(), 5);
    }

    #[test]
    fn read_missing_record_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        assert!(matches!(store.read("session-nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn latest_without_directory_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("missing"), 5);
        assert_eq!(store.latest().unwrap(), None);
        assert!(!tmp.path().join("missing").exists());
    }

    #[test]
    fn resolve_selectors() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        let a = store.create_at(&owned(&["/a"]), &at(9, 0, 0)).unwrap().filename;
        let b = store.create_at(&owned(&["/b"]), &at(10, 0, 0)).unwrap().filename;
        touch(&store.path_for(&a), 1_000);
        touch(&store.path_for(&b), 2_000);

        assert_eq!(store.resolve(&Selector::Latest).unwrap().filename, b);
        assert_eq!(store.resolve(&Selector::Position(1)).unwrap().filename, a);
        assert_eq!(store.resolve(&Selector::Name(a.clone())).unwrap().filename, a);
        assert!(matches!(store.resolve(&Selector::Position(2)), Err(Error::NotFound(_))));
        assert!(matches!(
            store.resolve(&Selector::Name("session-missing".into())),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn resolve_latest_on_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path(), 5);
        assert!(matches!(store.resolve(&Selector::Latest), Err(Error::NotFound(_))));
    }
}
