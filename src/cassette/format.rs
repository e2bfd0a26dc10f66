//! Cassette data structures for recording and replaying interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (`"fs"` or `"git"`).
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Creates an empty cassette stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, interactions: Vec<Interaction>) -> Self {
        Self { name: name.into(), recorded_at: Utc::now(), interactions }
    }
}

/// A recorded `Result`, stored as `{"ok": ...}` or `{"err": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T, E> {
    /// The port call succeeded.
    Ok(T),
    /// The port call failed.
    Err(E),
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(e) => Err(e),
        }
    }
}
