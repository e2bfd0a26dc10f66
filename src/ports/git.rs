//! Git history port for per-file commit timestamps.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a history query produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryError {
    /// Git cannot answer for this path at all (binary missing, not a repository).
    #[error("git unavailable: {0}")]
    Unavailable(String),

    /// Git ran and failed.
    #[error("git query failed: {0}")]
    Failed(String),
}

/// Provides read access to the commit history of individual files.
///
/// Timestamps are returned as git prints them (strict ISO 8601); callers
/// parse and reformat them.
pub trait GitHistory: Send + Sync {
    /// Returns the author date of the most recent commit touching `path`,
    /// or `None` when the file has never been committed.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if git cannot be run or the query fails.
    fn last_change(&self, path: &Path) -> Result<Option<String>, HistoryError>;

    /// Returns the author dates of every commit touching `path`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if git cannot be run or the query fails.
    fn change_history(&self, path: &Path) -> Result<Vec<String>, HistoryError>;
}
