//! Replaying adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::Mutex;

use super::{next_output, next_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::{FileSystem, FileTimes};

/// Replays recorded filesystem operations from a cassette.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a new replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(
        &self,
        _path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        next_result::<String, String>(&self.replayer, "fs", "read_to_string").map_err(Into::into)
    }

    fn write(
        &self,
        _path: &Path,
        _contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        next_result::<(), String>(&self.replayer, "fs", "write").map_err(Into::into)
    }

    fn exists(&self, _path: &Path) -> bool {
        next_output(&self.replayer, "fs", "exists")
    }

    fn file_times(
        &self,
        _path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>> {
        next_result::<FileTimes, String>(&self.replayer, "fs", "file_times").map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn make_replayer(method: &str, output: serde_json::Value) -> CassetteReplayer {
        CassetteReplayer::new(&Cassette::new(
            "test",
            vec![Interaction {
                seq: 0,
                port: "fs".into(),
                method: method.into(),
                input: json!({"path": "posts/a.md"}),
                output,
            }],
        ))
    }

    #[test]
    fn replays_read_to_string() {
        let fs = ReplayingFileSystem::new(make_replayer("read_to_string", json!({"ok": "# A"})));
        assert_eq!(fs.read_to_string(Path::new("posts/a.md")).unwrap(), "# A");
    }

    #[test]
    fn replays_file_times() {
        let fs = ReplayingFileSystem::new(make_replayer(
            "file_times",
            json!({"ok": {"modified": "2020-10-22T06:47:56Z", "changed": "2020-10-01T00:00:00Z"}}),
        ));
        let times = fs.file_times(Path::new("posts/a.md")).unwrap();
        assert_eq!(times.modified.to_rfc3339(), "2020-10-22T06:47:56+00:00");
        assert_eq!(times.changed.to_rfc3339(), "2020-10-01T00:00:00+00:00");
    }

    #[test]
    fn replays_recorded_error() {
        let fs = ReplayingFileSystem::new(make_replayer(
            "file_times",
            json!({"err": "No such file or directory"}),
        ));
        let err = fs.file_times(Path::new("posts/a.md")).unwrap_err();
        assert!(err.to_string().contains("No such file"));
    }

    #[test]
    fn replays_exists() {
        let fs = ReplayingFileSystem::new(make_replayer("exists", json!(true)));
        assert!(fs.exists(Path::new("posts/a.md")));
    }
}
