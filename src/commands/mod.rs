//! Command dispatch and handlers.

pub mod stamp;
pub mod times;

use std::env;
use std::path::PathBuf;

use crate::cli::Command;
use crate::context::ServiceContext;

/// Dispatch a parsed command to its handler.
///
/// When `MDSTAMP_RECORD` is set to a file path, all port interactions are
/// recorded to a cassette at that path.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let ctx = match env::var("MDSTAMP_RECORD") {
        Ok(path) => ServiceContext::recording(&PathBuf::from(path)),
        Err(_) => ServiceContext::live(),
    };

    let result = dispatch_with_context(command, &ctx);

    // Finish recording after the command completes (even on error)
    if let Some(path) = ctx.finish_recording()? {
        eprintln!("Recording saved to: {}", path.display());
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<(), String> {
    match command {
        Command::Stamp { files, no_git, dry_run, config } => {
            stamp::run(ctx, files, &stamp::StampOptions {
                no_git: *no_git,
                dry_run: *dry_run,
                config: config.clone(),
            })
        }
        Command::Times { files, no_git } => times::run(ctx, files, *no_git),
    }
}
