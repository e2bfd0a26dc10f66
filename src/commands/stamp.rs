//! `mdstamp stamp` command.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{StampConfig, DEFAULT_CONFIG_FILE};
use crate::context::ServiceContext;
use crate::document::{Document, Root};
use crate::error::StampError;
use crate::transform::transform;

/// Flags of the `stamp` command.
#[derive(Debug, Clone, Default)]
pub struct StampOptions {
    /// Force file times.
    pub no_git: bool,
    /// Print instead of writing.
    pub dry_run: bool,
    /// Explicit config file.
    pub config: Option<PathBuf>,
}

/// Execute the `stamp` command.
///
/// Every file is attempted; a failure on one file is reported and the rest
/// are still processed. Diagnostics are logged as warnings as they occur.
///
/// # Errors
///
/// Returns an error string if the config cannot be loaded or any file failed.
pub fn run(ctx: &ServiceContext, files: &[PathBuf], options: &StampOptions) -> Result<(), String> {
    let mut config = load_config(ctx, options.config.as_deref())?;
    if options.no_git {
        config.git = false;
    }

    let mut failed = 0usize;
    for path in files {
        match stamp_file(ctx, &config, path) {
            Ok((doc, rendered)) => {
                if options.dry_run {
                    if files.len() > 1 {
                        println!("==> {} <==", path.display());
                    }
                    print!("{rendered}");
                } else {
                    let out = doc.output_path();
                    if let Err(e) = ctx.fs.write(out, &rendered) {
                        failed += 1;
                        eprintln!("error: failed to write {}: {e}", out.display());
                        continue;
                    }
                    println!("Stamped {}", path.display());
                }
                if !doc.messages.is_empty() {
                    debug!(path = %path.display(), count = doc.messages.len(), "stamped with diagnostics");
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("error: {}: {e}", path.display());
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} file(s) failed", files.len()));
    }
    Ok(())
}

/// Resolves the config: an explicit path, then the default file if it
/// exists, then the built-in default.
fn load_config(ctx: &ServiceContext, explicit: Option<&Path>) -> Result<StampConfig, String> {
    let config = match explicit {
        Some(path) => StampConfig::load(ctx, path),
        None if ctx.fs.exists(Path::new(DEFAULT_CONFIG_FILE)) => {
            StampConfig::load(ctx, Path::new(DEFAULT_CONFIG_FILE))
        }
        None => {
            info!("no config file, using defaults");
            Ok(StampConfig::default())
        }
    };
    config.map_err(|e| e.to_string())
}

/// Reads, stamps and renders one file without writing it.
fn stamp_file(
    ctx: &ServiceContext,
    config: &StampConfig,
    path: &Path,
) -> Result<(Document, String), StampError> {
    let text = ctx
        .fs
        .read_to_string(path)
        .map_err(|e| StampError::Io { path: path.to_path_buf(), reason: e.to_string() })?;
    let mut root = Root::parse(&text);
    let mut doc = Document::new(path);
    transform(&mut root, &mut doc, config, ctx)?;
    Ok((doc, root.render()))
}
