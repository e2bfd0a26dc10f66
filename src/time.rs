//! Creation and modification times of a document.
//!
//! Git history is preferred: "modified" is the newest commit touching the
//! file, "created" the oldest. Without git (disabled, binary missing, or the
//! file lives outside any repository) the filesystem's `mtime` and `ctime`
//! are used. An unknown time is the empty string.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::context::ServiceContext;
use crate::document::Document;
use crate::error::{Result, StampError};
use crate::ports::{FileTimes, HistoryError};

const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats an instant the way every resolved timestamp is written,
/// e.g. `Thu, 22 Oct 2020 06:47:56 GMT`.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp produced by [`format_timestamp`] (any RFC 2822 date
/// is accepted, as is RFC 3339). Returns `None` for empty or invalid input.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Both timestamps of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTimes {
    /// Formatted creation time, or empty when unknown.
    pub created: String,
    /// Formatted modification time, or empty when unknown.
    pub modified: String,
}

/// Which end of the history a query wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Which {
    Created,
    Modified,
}

/// Resolves document timestamps through the context's git and fs ports.
pub struct TimeResolver<'a> {
    ctx: &'a ServiceContext,
    use_git: bool,
}

impl<'a> TimeResolver<'a> {
    /// Creates a resolver. `use_git` selects history over file attributes.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, use_git: bool) -> Self {
        Self { ctx, use_git }
    }

    /// Time of the most recent change to the document.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::History`] if git ran and failed.
    pub fn resolve_modified(&self, doc: &mut Document) -> Result<String> {
        self.resolve_one(doc, Which::Modified)
    }

    /// Time the document first appeared.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::History`] if git ran and failed.
    pub fn resolve_created(&self, doc: &mut Document) -> Result<String> {
        self.resolve_one(doc, Which::Created)
    }

    /// Both timestamps. Git is asked once per end of the history; when it
    /// is unavailable, or for filesystem mode, the file is stat-ed once and
    /// at most one diagnostic of each kind is attached.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::History`] if git ran and failed.
    pub fn resolve(&self, doc: &mut Document) -> Result<ResolvedTimes> {
        if self.use_git {
            match self.git_times(doc) {
                Ok(times) => return Ok(times),
                Err(e) => fall_back(doc, e)?,
            }
        }
        Ok(self.stat(doc).map_or_else(ResolvedTimes::default, |times| ResolvedTimes {
            modified: format_timestamp(times.modified),
            created: format_timestamp(times.changed),
        }))
    }

    fn resolve_one(&self, doc: &mut Document, which: Which) -> Result<String> {
        if self.use_git {
            match self.from_git(doc, which) {
                Ok(stamp) => return Ok(stamp),
                Err(e) => fall_back(doc, e)?,
            }
        }
        Ok(self.stat(doc).map_or_else(String::new, |times| {
            format_timestamp(match which {
                Which::Modified => times.modified,
                Which::Created => times.changed,
            })
        }))
    }

    fn git_times(&self, doc: &Document) -> std::result::Result<ResolvedTimes, HistoryError> {
        let modified = self.from_git(doc, Which::Modified)?;
        let created = self.from_git(doc, Which::Created)?;
        Ok(ResolvedTimes { created, modified })
    }

    fn from_git(&self, doc: &Document, which: Which) -> std::result::Result<String, HistoryError> {
        let raw = match which {
            Which::Modified => self.ctx.git.last_change(&doc.path)?,
            Which::Created => self.ctx.git.change_history(&doc.path)?.into_iter().next(),
        };
        let Some(raw) = raw else {
            debug!(path = %doc.path.display(), ?which, "no history, time unknown");
            return Ok(String::new());
        };
        parse_timestamp(&raw)
            .map(format_timestamp)
            .ok_or_else(|| HistoryError::Failed(format!("unparseable commit date {raw:?}")))
    }

    fn stat(&self, doc: &mut Document) -> Option<FileTimes> {
        match self.ctx.fs.file_times(&doc.path) {
            Ok(times) => Some(times),
            Err(e) => {
                doc.message(format!("cannot stat {}: {e}", doc.path.display()));
                None
            }
        }
    }
}

/// Unavailable git becomes a diagnostic; any other failure is fatal.
fn fall_back(doc: &mut Document, error: HistoryError) -> Result<()> {
    match error {
        HistoryError::Unavailable(reason) => {
            doc.message(format!("git unavailable, using file times: {reason}"));
            Ok(())
        }
        source => Err(StampError::History { path: doc.path.clone(), source }),
    }
}
