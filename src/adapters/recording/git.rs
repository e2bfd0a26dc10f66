//! Recording adapter for the `GitHistory` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{record_interaction, PathInput};
use crate::cassette::format::Outcome;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{GitHistory, HistoryError};

/// Records git history queries while delegating to an inner implementation.
///
/// Errors are stored as structured [`HistoryError`] values so replay can tell
/// an unavailable repository from a failed query.
pub struct RecordingGitHistory {
    inner: Box<dyn GitHistory>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingGitHistory {
    /// Creates a new recording git history wrapping the given implementation.
    pub fn new(inner: Box<dyn GitHistory>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }

    fn record<T: serde::Serialize>(
        &self,
        method: &str,
        path: &Path,
        result: &Result<T, HistoryError>,
    ) {
        let outcome = match result {
            Ok(v) => Outcome::Ok(v),
            Err(e) => Outcome::Err(e),
        };
        record_interaction(&self.recorder, "git", method, &PathInput::new(path), &outcome);
    }
}

impl GitHistory for RecordingGitHistory {
    fn last_change(&self, path: &Path) -> Result<Option<String>, HistoryError> {
        let result = self.inner.last_change(path);
        self.record("last_change", path, &result);
        result
    }

    fn change_history(&self, path: &Path) -> Result<Vec<String>, HistoryError> {
        let result = self.inner.change_history(path);
        self.record("change_history", path, &result);
        result
    }
}
