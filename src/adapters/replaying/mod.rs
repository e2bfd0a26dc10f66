//! Replaying adapters that serve recorded interactions.

pub mod filesystem;
pub mod git;

pub use filesystem::ReplayingFileSystem;
pub use git::ReplayingGitHistory;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::format::Outcome;
use crate::cassette::replayer::CassetteReplayer;

/// Pull the next recorded output for `port::method` and decode it.
///
/// # Panics
///
/// Panics if the cassette is exhausted or the recorded output does not have
/// the expected shape; a mismatched cassette is a broken test fixture.
pub(crate) fn next_output<T: DeserializeOwned>(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> T {
    let interaction = {
        let mut replayer = replayer.lock().expect("replayer lock poisoned");
        replayer.next_interaction(port, method)
    };
    serde_json::from_value(interaction.output).unwrap_or_else(|e| {
        panic!("{port}::{method}: recorded output has unexpected shape (seq={}): {e}", interaction.seq)
    })
}

/// Like [`next_output`], for outputs recorded with the ok/err convention.
pub(crate) fn next_result<T: DeserializeOwned, E: DeserializeOwned>(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Result<T, E> {
    next_output::<Outcome<T, E>>(replayer, port, method).into()
}
