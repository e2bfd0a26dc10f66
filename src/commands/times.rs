//! `mdstamp times` command.

use std::path::PathBuf;

use crate::context::ServiceContext;
use crate::document::Document;
use crate::time::TimeResolver;

/// Execute the `times` command, printing both timestamps of each file.
///
/// # Errors
///
/// Returns an error string if git failed for any file.
pub fn run(ctx: &ServiceContext, files: &[PathBuf], no_git: bool) -> Result<(), String> {
    let resolver = TimeResolver::new(ctx, !no_git);
    let mut failed = 0usize;
    for path in files {
        let mut doc = Document::new(path);
        match resolver.resolve(&mut doc) {
            Ok(times) => {
                println!("{}", path.display());
                println!("  created:  {}", or_unknown(&times.created));
                println!("  modified: {}", or_unknown(&times.modified));
            }
            Err(e) => {
                failed += 1;
                eprintln!("error: {e}");
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {} file(s) failed", files.len()));
    }
    Ok(())
}

fn or_unknown(stamp: &str) -> &str {
    if stamp.is_empty() {
        "unknown"
    } else {
        stamp
    }
}
