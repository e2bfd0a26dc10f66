//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. Ports without a cassette path panic
/// if called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the filesystem port cassette file.
    pub fs: Option<PathBuf>,
    /// Path to the git port cassette file.
    pub git: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
    /// Replayer for the git port.
    pub git: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Reads and parses a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Path| Self::load_cassette(path).map(|c| CassetteReplayer::new(&c));
        Ok(PortReplayers {
            fs: self.fs.as_deref().map(load).transpose()?,
            git: self.git.as_deref().map(load).transpose()?,
        })
    }
}
