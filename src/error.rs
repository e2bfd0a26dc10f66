//! Error type for stamping a single document.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::MatterKind;
use crate::ports::HistoryError;

/// Fatal errors that abort stamping of the current document.
///
/// Soft failures (unknown timestamps, git unavailable) never surface here;
/// they are attached to the [`Document`](crate::document::Document) as
/// diagnostics instead.
#[derive(Debug, Error)]
pub enum StampError {
    /// Git ran for a tracked path and failed.
    #[error("history query for {path} failed: {source}")]
    History {
        /// Document whose history was queried.
        path: PathBuf,
        /// Underlying git failure.
        #[source]
        source: HistoryError,
    },

    /// Existing frontmatter could not be parsed as a mapping.
    #[error("malformed {kind} frontmatter: {reason}")]
    Frontmatter {
        /// Format the block claims to be.
        kind: MatterKind,
        /// Parser message.
        reason: String,
    },

    /// The merged mapping could not be written back.
    #[error("failed to serialize {kind} frontmatter: {reason}")]
    Serialize {
        /// Target format.
        kind: MatterKind,
        /// Serializer message.
        reason: String,
    },

    /// A caller-supplied compute function failed.
    #[error("computing field `{field}` failed: {reason}")]
    Compute {
        /// Name of the field being computed.
        field: String,
        /// Message from the compute function.
        reason: String,
    },

    /// The configuration file is invalid.
    #[error("invalid config: {0}")]
    Config(String),

    /// Reading or writing the document failed.
    #[error("{path}: {reason}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// I/O failure message.
        reason: String,
    },
}

/// Convenience alias used throughout the stamping core.
pub type Result<T> = std::result::Result<T, StampError>;
