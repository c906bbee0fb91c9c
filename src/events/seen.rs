//! Record of peak events already reported to the operator.
//!
//! The scheduler typically runs from cron every few minutes; without this
//! record every run would repeat the "upcoming peak event" announcement. The
//! store keeps one event id per line and only ever appends.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::PeakEvent;

/// Backing storage for seen-event ids.
pub trait SeenStore {
    fn load(&self) -> io::Result<HashSet<String>>;
    fn save(&mut self, id: &str) -> io::Result<()>;
}

/// Line-per-id file storage.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }
}

impl SeenStore for FileStore {
    fn load(&self) -> io::Result<HashSet<String>> {
        match fs::read_to_string(&self.path) {
            Ok(body) => Ok(body.lines().map(str::to_string).collect()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, id: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{id}")
    }
}

/// Per-user default location of the seen-event file.
pub fn default_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home)
            .join(".cache")
            .join("peaksched")
            .join("seen_events"),
        None => PathBuf::from("seen_events"),
    }
}

/// The set of events already announced, loaded once and kept in sync with
/// its backing store as new events are recorded.
pub struct SeenEvents {
    store: Box<dyn SeenStore>,
    seen: HashSet<String>,
}

impl SeenEvents {
    /// Load the seen set from a file at `path`.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Self::with_store(Box::new(FileStore::new(path)))
    }

    pub fn with_store(store: Box<dyn SeenStore>) -> io::Result<Self> {
        let seen = store.load()?;
        Ok(SeenEvents { store, seen })
    }

    /// Whether `event` has already been announced.
    pub fn contains(&self, event: &PeakEvent) -> bool {
        self.seen.contains(&event.id())
    }

    /// Record `event` as announced.
    pub fn record(&mut self, event: &PeakEvent) -> io::Result<()> {
        let id = event.id();
        if self.seen.insert(id.clone()) {
            self.store.save(&id)?;
        }
        Ok(())
    }
}
