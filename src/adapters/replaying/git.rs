//! Replaying adapter for the `GitHistory` port.

use std::path::Path;
use std::sync::Mutex;

use super::next_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::git::{GitHistory, HistoryError};

/// Replays recorded git history queries from a cassette.
pub struct ReplayingGitHistory {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingGitHistory {
    /// Creates a new replaying git history from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl GitHistory for ReplayingGitHistory {
    fn last_change(&self, _path: &Path) -> Result<Option<String>, HistoryError> {
        next_result(&self.replayer, "git", "last_change")
    }

    fn change_history(&self, _path: &Path) -> Result<Vec<String>, HistoryError> {
        next_result(&self.replayer, "git", "change_history")
    }
}
