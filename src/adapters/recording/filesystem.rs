//! Recording adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::{record_interaction, record_result, PathInput};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{FileSystem, FileTimes};

/// Records filesystem interactions while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct WriteInput<'a> {
    path: String,
    contents: &'a str,
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.read_to_string(path);
        record_result(&self.recorder, "fs", "read_to_string", &PathInput::new(path), &result);
        result
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.write(path, contents);
        let input = WriteInput { path: path.display().to_string(), contents };
        record_result(&self.recorder, "fs", "write", &input, &result);
        result
    }

    fn exists(&self, path: &Path) -> bool {
        let result = self.inner.exists(path);
        record_interaction(&self.recorder, "fs", "exists", &PathInput::new(path), &result);
        result
    }

    fn file_times(
        &self,
        path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.file_times(path);
        record_result(&self.recorder, "fs", "file_times", &PathInput::new(path), &result);
        result
    }
}
