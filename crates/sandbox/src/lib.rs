mod authorize;
mod context;
mod path;

pub use authorize::{AuthorizedPath, PathSandbox};
pub use context::{SandboxConfig, TRASH_DIR_NAME};
pub use path::{expand_home, is_under_any_root, path_starts_with};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How path components are compared when checking root membership.
///
/// Only the comparison is affected. Paths handed out for I/O keep the case the
/// caller (or the filesystem) supplied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Matches the usual behaviour of the platform's default filesystem.
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error(
        "Access denied - path outside allowed directories: {}{}",
        .path.display(),
        resolved_suffix(.resolved)
    )]
    AccessDenied {
        path: PathBuf,
        resolved: Option<PathBuf>,
    },
    #[error("Parent directory does not exist: {}", .parent.display())]
    ParentMissing { path: PathBuf, parent: PathBuf },
    #[error("No allowed directories configured")]
    NoRoots,
    #[error("Invalid allowed directory {}: {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },
    #[error("Cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
}

fn resolved_suffix(resolved: &Option<PathBuf>) -> String {
    match resolved {
        Some(path) => format!(" (resolves to {})", path.display()),
        None => String::new(),
    }
}

impl SandboxError {
    pub(crate) fn denied(path: &Path, resolved: Option<&Path>) -> Self {
        SandboxError::AccessDenied {
            path: path.to_path_buf(),
            resolved: resolved.map(Path::to_path_buf),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, SandboxError::AccessDenied { .. })
    }
}
