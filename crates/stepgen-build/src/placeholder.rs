//! Intermediate placeholder files
//!
//! IDE projects declare a `.cpp` meta-object step against a small placeholder
//! file instead of the source itself. The placeholder only has to exist; its
//! content is the source path. Failures here never abort generation.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Windows `ERROR_SHARING_VIOLATION`
const SHARING_VIOLATION: i32 = 32;

/// Result of a placeholder creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderOutcome {
    Created,
    /// The file was already there
    Existing,
    /// Another process created or held the file at the same time
    Contended,
    /// Creation failed; already logged
    Failed,
}

fn is_contention(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::AlreadyExists
        || (cfg!(windows) && error.raw_os_error() == Some(SHARING_VIOLATION))
}

/// Create `intermediate` with the source path as its only line, if missing
pub fn ensure_placeholder(source: &Path, intermediate: &Path) -> PlaceholderOutcome {
    if intermediate.exists() {
        return PlaceholderOutcome::Existing;
    }

    if let Some(parent) = intermediate.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "cannot create placeholder directory");
            return PlaceholderOutcome::Failed;
        }
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(intermediate);

    match file {
        Ok(mut file) => match writeln!(file, "{}", source.display()) {
            Ok(()) => {
                info!(path = %intermediate.display(), "created placeholder");
                PlaceholderOutcome::Created
            }
            Err(e) => {
                warn!(path = %intermediate.display(), error = %e, "cannot write placeholder");
                PlaceholderOutcome::Failed
            }
        },
        Err(e) if is_contention(&e) => {
            debug!(path = %intermediate.display(), "placeholder created concurrently");
            PlaceholderOutcome::Contended
        }
        Err(e) => {
            warn!(path = %intermediate.display(), error = %e, "cannot create placeholder");
            PlaceholderOutcome::Failed
        }
    }
}
