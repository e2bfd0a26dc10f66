//! Live filesystem adapter using `std::fs`.

use std::fs::Metadata;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::ports::filesystem::{FileSystem, FileTimes};

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

#[cfg(unix)]
fn changed_time(meta: &Metadata) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync>> {
    use std::os::unix::fs::MetadataExt;

    let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
    DateTime::from_timestamp(meta.ctime(), nanos).ok_or_else(|| "ctime out of range".into())
}

#[cfg(not(unix))]
fn changed_time(meta: &Metadata) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(meta.created().or_else(|_| meta.modified())?.into())
}

impl FileSystem for LiveFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, contents)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn file_times(
        &self,
        path: &Path,
    ) -> Result<FileTimes, Box<dyn std::error::Error + Send + Sync>> {
        let meta = std::fs::metadata(path)?;
        let modified: DateTime<Utc> = meta.modified()?.into();
        Ok(FileTimes { modified, changed: changed_time(&meta)? })
    }
}
