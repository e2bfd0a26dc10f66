//! Recording adapters that capture interactions to cassettes.

pub mod filesystem;
pub mod git;

pub use filesystem::RecordingFileSystem;
pub use git::RecordingGitHistory;

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

use crate::cassette::format::Outcome;
use crate::cassette::recorder::CassetteRecorder;

/// Input payload shared by every path-keyed port method.
#[derive(Serialize)]
pub(crate) struct PathInput {
    path: String,
}

impl PathInput {
    pub(crate) fn new(path: &Path) -> Self {
        Self { path: path.display().to_string() }
    }
}

/// Record one interaction. Serialization failures are logged and the
/// interaction is dropped; recording never changes what the caller sees.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let (input_json, output_json) =
        match (serde_json::to_value(input), serde_json::to_value(output)) {
            (Ok(i), Ok(o)) => (i, o),
            (Err(e), _) | (_, Err(e)) => {
                warn!(port, method, error = %e, "failed to serialize interaction, not recorded");
                return;
            }
        };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input_json, output_json),
        Err(e) => warn!(port, method, error = %e, "recorder lock poisoned"),
    }
}

/// Record a `Result` whose error only needs to survive as a message.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let outcome = match result {
        Ok(v) => Outcome::Ok(v),
        Err(e) => Outcome::Err(e.to_string()),
    };
    record_interaction(recorder, port, method, input, &outcome);
}
