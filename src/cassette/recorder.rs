//! Records interactions into a cassette file.

use std::path::PathBuf;

use super::format::{Cassette, Interaction};

/// Records interactions and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), interactions: Vec::new(), next_seq: 0 }
    }

    /// Record an interaction. The `seq` field is assigned automatically.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let interaction = Interaction {
            seq: self.next_seq,
            port: port.into(),
            method: method.into(),
            input,
            output,
        };
        self.next_seq += 1;
        self.interactions.push(interaction);
    }

    /// Path the cassette is written to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Write everything recorded so far as a YAML cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette::new(self.name.clone(), self.interactions.clone());
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }

    /// Finish recording and write the cassette YAML file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_finish() {
        let dir = std::env::temp_dir().join("mdstamp_cassette_recorder_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "test-recording");
        assert!(recorder.is_empty());
        recorder.record("git", "last_change", json!({"path": "a.md"}), json!({"ok": null}));
        recorder.record("fs", "file_times", json!({"path": "a.md"}), json!({"err": "gone"}));
        assert_eq!(recorder.len(), 2);

        let result_path = recorder.finish().expect("finish should succeed");
        assert_eq!(result_path, path);

        let content = std::fs::read_to_string(&path).unwrap();
        let cassette: Cassette = serde_yaml::from_str(&content).unwrap();

        assert_eq!(cassette.name, "test-recording");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].seq, 0);
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[0].port, "git");
        assert_eq!(cassette.interactions[1].port, "fs");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
