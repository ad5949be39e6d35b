use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Canonicalize the build root if possible, falling back to the given path
/// joined onto the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Derive the `:name` part of a buck2 target label, tolerating both bare
/// names and full `cell//pkg:name` labels.
pub fn target_short_name(target: &str) -> &str {
    match target.rfind(':') {
        Some(idx) => &target[idx + 1..],
        None => target,
    }
}
