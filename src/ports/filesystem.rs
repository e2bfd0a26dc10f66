//! Filesystem port for document I/O and timestamp attributes.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp attributes of a file as reported by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTimes {
    /// Last content modification (`mtime`).
    pub modified: DateTime<Utc>,
    /// Last status change (`ctime`), used as the creation time.
    pub changed: DateTime<Utc>,
}

/// Provides filesystem access for reading, writing and inspecting documents.
///
/// Abstracting the filesystem allows deterministic replay and testing
/// without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Writes the given contents to a file, creating or overwriting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the modification and status-change times of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'ed.
    fn file_times(
        &self,
        path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>>;
}
