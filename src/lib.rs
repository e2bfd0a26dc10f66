//! Stamp creation and modification times, literals and computed values into
//! the frontmatter of Markdown documents.
//!
//! The core entry point is [`transform::transform`], which merges a
//! [`config::StampConfig`] into the frontmatter of a parsed
//! [`document::Root`]. Time lookups go through the ports bundled in a
//! [`context::ServiceContext`] so they can be recorded and replayed.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod field;
pub mod merge;
pub mod ports;
pub mod time;
pub mod transform;

#[cfg(test)]
mod testing;

pub use config::StampConfig;
pub use document::{Document, Root};
pub use error::{Result, StampError};
pub use field::{FieldSpec, FieldSpecs};
pub use transform::transform;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["mdstamp", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_errors_without_files() {
        let result = run(["mdstamp", "times"]);
        assert!(result.is_err());
    }
}
