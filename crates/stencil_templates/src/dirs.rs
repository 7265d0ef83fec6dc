//! Target directory validation and creation.
//!
//! An invalid directory path is a caller bug, not a user error: under the
//! default policy it is logged and replaced by the configured fallback
//! directory so one bad path cannot abort a whole multi-file generation
//! run. Real filesystem failures (permissions, disk full) still propagate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::{EngineConfig, InvalidPathPolicy};
use crate::error::{TemplateError, TemplateResult};

/// Validate a target directory path, create it (recursively) if absent, and
/// return the path actually used.
///
/// An empty, whitespace-only, or NUL-containing path is handled per
/// `config.invalid_path_policy`: either substituted by the fallback
/// directory or rejected with [`TemplateError::InvalidTargetDir`].
/// Re-ensuring an existing directory is a no-op.
pub fn ensure_directory_exists(dir_path: &str, config: &EngineConfig) -> TemplateResult<PathBuf> {
    let trimmed = dir_path.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return match config.invalid_path_policy {
            InvalidPathPolicy::Fail => {
                Err(TemplateError::InvalidTargetDir(dir_path.to_string()))
            }
            InvalidPathPolicy::Fallback => {
                error!(
                    "Invalid target directory {:?}, substituting fallback {:?}",
                    dir_path, config.fallback_dir
                );
                create_if_absent(&config.fallback_dir)?;
                info!("Using fallback directory {:?}", config.fallback_dir);
                Ok(config.fallback_dir.clone())
            }
        };
    }

    let path = PathBuf::from(trimmed);
    create_if_absent(&path)?;
    Ok(path)
}

/// Create a directory tree only when it does not exist yet, tolerating the
/// race where another caller created it first.
fn create_if_absent(path: &Path) -> TemplateResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    match fs::create_dir_all(path) {
        Ok(()) => {
            info!("Created directory {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(TemplateError::Io(e)),
    }
}
