//! Service context bundling the port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::git::LiveGitHistory;
use crate::adapters::recording::{RecordingFileSystem, RecordingGitHistory};
use crate::adapters::replaying::{ReplayingFileSystem, ReplayingGitHistory};
use crate::cassette::config::CassetteConfig;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::{FileSystem, FileTimes};
use crate::ports::git::{GitHistory, HistoryError};

/// Bundles the port trait objects a stamping pass talks through.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying).
pub struct ServiceContext {
    /// Filesystem for document I/O and file times.
    pub fs: Box<dyn FileSystem>,
    /// Git history for commit timestamps.
    pub git: Box<dyn GitHistory>,
    /// Shared cassette recorder; saved to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context backed by the real disk and `git` binary.
    #[must_use]
    pub fn live() -> Self {
        Self::with_ports(Box::new(LiveFileSystem), Box::new(LiveGitHistory))
    }

    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn with_ports(fs: Box<dyn FileSystem>, git: Box<dyn GitHistory>) -> Self {
        Self { fs, git, recorder: None }
    }

    /// Creates a live context that records every port call to a cassette
    /// written to `path` when the context is dropped.
    #[must_use]
    pub fn recording(path: &Path) -> Self {
        let name = path.file_stem().map_or_else(
            || "mdstamp-session".to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        );
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, name)));
        Self {
            fs: Box::new(RecordingFileSystem::new(Box::new(LiveFileSystem), Arc::clone(&recorder))),
            git: Box::new(RecordingGitHistory::new(
                Box::new(LiveGitHistory),
                Arc::clone(&recorder),
            )),
            recorder: Some(recorder),
        }
    }

    /// Creates a replaying context from a single cassette holding both ports.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteConfig::load_cassette(path)?;
        // Each port gets its own replayer so per-port queues are independent.
        Ok(Self::with_ports(
            Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            Box::new(ReplayingGitHistory::new(CassetteReplayer::new(&cassette))),
        ))
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette panic with a clear message when
    /// called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self::with_ports(
            match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(UnconfiguredFileSystem),
            },
            match replayers.git {
                Some(r) => Box::new(ReplayingGitHistory::new(r)),
                None => Box::new(UnconfiguredGitHistory),
            },
        ))
    }

    /// Where the cassette of a recording context will be written.
    #[must_use]
    pub fn recording_path(&self) -> Option<PathBuf> {
        let recorder = self.recorder.as_ref()?;
        let guard = recorder.lock().ok()?;
        Some(guard.path().to_path_buf())
    }

    /// Writes the cassette of a recording context and returns its path.
    /// Returns `Ok(None)` for contexts that do not record.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be written.
    pub fn finish_recording(mut self) -> Result<Option<PathBuf>, String> {
        let Some(recorder) = self.recorder.take() else {
            return Ok(None);
        };
        let saved = match recorder.lock() {
            Ok(guard) => guard.save(),
            Err(e) => return Err(format!("Recorder lock poisoned: {e}")),
        };
        saved.map(Some).map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let saved = match recorder.lock() {
            Ok(guard) => guard.save(),
            Err(e) => {
                warn!(error = %e, "recorder lock poisoned, cassette not written");
                return;
            }
        };
        match saved {
            Ok(path) => info!(path = %path.display(), "recording saved"),
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}

// --- Panicking adapters for ports without a cassette ---

struct UnconfiguredFileSystem;
impl FileSystem for UnconfiguredFileSystem {
    fn read_to_string(
        &self,
        _path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig (no cassette loaded for fs)");
    }
    fn write(
        &self,
        _path: &Path,
        _contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig (no cassette loaded for fs)");
    }
    fn exists(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig (no cassette loaded for fs)");
    }
    fn file_times(
        &self,
        _path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig (no cassette loaded for fs)");
    }
}

struct UnconfiguredGitHistory;
impl GitHistory for UnconfiguredGitHistory {
    fn last_change(&self, _path: &Path) -> Result<Option<String>, HistoryError> {
        panic!("GitHistory port not configured in CassetteConfig (no cassette loaded for git)");
    }
    fn change_history(&self, _path: &Path) -> Result<Vec<String>, HistoryError> {
        panic!("GitHistory port not configured in CassetteConfig (no cassette loaded for git)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let yaml = serde_yaml::to_string(&Cassette::new("test", interactions)).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    #[test]
    fn replaying_context_from_monolithic_cassette() {
        let dir = std::env::temp_dir().join("mdstamp_ctx_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");

        write_cassette(
            &path,
            vec![
                Interaction {
                    seq: 0,
                    port: "git".into(),
                    method: "last_change".into(),
                    input: json!({"path": "a.md"}),
                    output: json!({"ok": "2024-06-15T10:30:00+00:00"}),
                },
                Interaction {
                    seq: 1,
                    port: "fs".into(),
                    method: "exists".into(),
                    input: json!({"path": "a.md"}),
                    output: json!(true),
                },
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(
            ctx.git.last_change(Path::new("a.md")).unwrap().as_deref(),
            Some("2024-06-15T10:30:00+00:00")
        );
        assert!(ctx.fs.exists(Path::new("a.md")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn recording_context_writes_cassette_on_drop() {
        let dir = std::env::temp_dir().join("mdstamp_ctx_test_recording");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let doc = dir.join("a.md");
        std::fs::write(&doc, "# A\n").unwrap();
        let cassette_path = dir.join("session.cassette.yaml");

        {
            let ctx = ServiceContext::recording(&cassette_path);
            assert_eq!(ctx.recording_path(), Some(cassette_path.clone()));
            assert_eq!(ctx.fs.read_to_string(&doc).unwrap(), "# A\n");
            assert!(ctx.fs.file_times(&doc).is_ok());
        }

        let replay = ServiceContext::replaying(&cassette_path).unwrap();
        assert_eq!(replay.fs.read_to_string(&doc).unwrap(), "# A\n");
        let times = replay.fs.file_times(&doc).unwrap();
        assert!(times.modified.timestamp() > 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn finish_recording_returns_cassette_path() {
        let dir = std::env::temp_dir().join("mdstamp_ctx_test_finish");
        let _ = std::fs::remove_dir_all(&dir);
        let cassette_path = dir.join("nested").join("run.cassette.yaml");

        let ctx = ServiceContext::recording(&cassette_path);
        let _ = ctx.fs.exists(&dir.join("nothing.md"));
        assert_eq!(ctx.finish_recording().unwrap(), Some(cassette_path.clone()));

        let cassette = CassetteConfig::load_cassette(&cassette_path).unwrap();
        assert_eq!(cassette.name, "run.cassette");
        assert_eq!(cassette.interactions.len(), 1);
        assert_eq!(cassette.interactions[0].method, "exists");

        assert_eq!(ServiceContext::live().finish_recording().unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let _ = ctx.git.last_change(Path::new("a.md"));
    }
}
