//! In-memory port fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::ports::{FileSystem, FileTimes, GitHistory, HistoryError};

/// In-memory filesystem for testing without touching disk.
#[derive(Default)]
pub(crate) struct FakeFs {
    files: Mutex<HashMap<PathBuf, String>>,
    times: HashMap<PathBuf, FileTimes>,
    read_only: HashSet<PathBuf>,
}

impl FakeFs {
    pub(crate) fn with_file(self, path: &str, contents: &str) -> Self {
        self.files.lock().unwrap().insert(PathBuf::from(path), contents.to_string());
        self
    }

    /// Makes writes to `path` fail.
    pub(crate) fn with_read_only(mut self, path: &str) -> Self {
        self.read_only.insert(PathBuf::from(path));
        self
    }

    pub(crate) fn with_times(
        mut self,
        path: &str,
        modified: DateTime<Utc>,
        changed: DateTime<Utc>,
    ) -> Self {
        self.times.insert(PathBuf::from(path), FileTimes { modified, changed });
        self
    }
}

impl FileSystem for FakeFs {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let files = self.files.lock().unwrap();
        files.get(path).cloned().ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.read_only.contains(path) {
            return Err(format!("Read-only file system: {}", path.display()).into());
        }
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.times.contains_key(path)
    }

    fn file_times(
        &self,
        path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>> {
        self.times
            .get(path)
            .copied()
            .ok_or_else(|| format!("No such file or directory: {}", path.display()).into())
    }
}

/// Git history fake answering every path with the same commit dates.
pub(crate) struct FakeGit {
    history: Result<Vec<String>, HistoryError>,
    calls: Arc<AtomicUsize>,
}

impl FakeGit {
    /// Commits touching every path, oldest first.
    pub(crate) fn with_history(dates: &[&str]) -> Self {
        Self {
            history: Ok(dates.iter().map(ToString::to_string).collect()),
            calls: Arc::default(),
        }
    }

    pub(crate) fn failing(error: HistoryError) -> Self {
        Self { history: Err(error), calls: Arc::default() }
    }

    /// Shared counter of queries made against this fake.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl GitHistory for FakeGit {
    fn last_change(&self, _path: &Path) -> Result<Option<String>, HistoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history.clone().map(|dates| dates.last().cloned())
    }

    fn change_history(&self, _path: &Path) -> Result<Vec<String>, HistoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history.clone()
    }
}
