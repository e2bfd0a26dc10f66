//! Live git adapter using `git log`.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::ports::git::{GitHistory, HistoryError};

/// Live git adapter that shells out to the `git` CLI.
///
/// Queries run from the file's own directory so the working directory of
/// the process does not matter.
pub struct LiveGitHistory;

impl LiveGitHistory {
    /// Builds `git -C <dir> log <args> -- <file>`. Messages are forced to the
    /// C locale so stderr can be classified.
    fn command(dir: &Path, args: &[&str], file: &OsStr) -> Command {
        let mut command = Command::new("git");
        command
            .arg("-C")
            .arg(dir)
            .arg("log")
            .args(args)
            .arg("--")
            .arg(file)
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C");
        command
    }

    fn log(path: &Path, args: &[&str]) -> Result<String, HistoryError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = path.file_name().unwrap_or_else(|| OsStr::new("."));

        debug!(path = %path.display(), ?args, "querying git history");
        let output = Self::command(dir, args, file)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => HistoryError::Unavailable(format!("git not found: {e}")),
                _ => HistoryError::Failed(format!("failed to run git log: {e}")),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Err(HistoryError::Unavailable(stderr.trim().to_string()));
            }
            // A freshly initialised repository has no history for any file.
            if stderr.contains("does not have any commits") {
                return Ok(String::new());
            }
            if dir.exists() {
                return Err(HistoryError::Failed(format!("git log failed: {}", stderr.trim())));
            }
            return Err(HistoryError::Unavailable(format!(
                "directory {} does not exist",
                dir.display()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GitHistory for LiveGitHistory {
    fn last_change(&self, path: &Path) -> Result<Option<String>, HistoryError> {
        let stdout = Self::log(path, &["-1", "--format=%aI"])?;
        let stamp = stdout.trim();
        Ok((!stamp.is_empty()).then(|| stamp.to_string()))
    }

    fn change_history(&self, path: &Path) -> Result<Vec<String>, HistoryError> {
        let stdout = Self::log(path, &["--reverse", "--format=%aI"])?;
        Ok(stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
    }
}
