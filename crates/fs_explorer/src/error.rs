use sandbox::SandboxError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse classification callers use to tell policy blocks from I/O trouble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    AccessDenied,
    ParentMissing,
    NotFound,
    CrossDeviceMove,
    AlreadyExists,
    CopyFailed,
    IoFailure,
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("Access denied - refusing to modify protected path: {}", .0.display())]
    Protected(PathBuf),
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error(
        "Cannot move {} to {}: they are on different volumes (copy and delete instead)",
        .from.display(),
        .to.display()
    )]
    CrossDeviceMove { from: PathBuf, to: PathBuf },
    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("Invalid archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[error("{}: {reason}", .path.display())]
    Unsupported { path: PathBuf, reason: String },
    #[error("I/O failure on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsError::Sandbox(SandboxError::AccessDenied { .. }) | FsError::Protected(_) => {
                FsErrorKind::AccessDenied
            }
            FsError::Sandbox(SandboxError::ParentMissing { .. }) => FsErrorKind::ParentMissing,
            FsError::NotFound(_) => FsErrorKind::NotFound,
            FsError::AlreadyExists(_) => FsErrorKind::AlreadyExists,
            FsError::CrossDeviceMove { .. } => FsErrorKind::CrossDeviceMove,
            FsError::CopyFailed { .. } => FsErrorKind::CopyFailed,
            FsError::Sandbox(_)
            | FsError::Archive { .. }
            | FsError::Unsupported { .. }
            | FsError::Io { .. } => FsErrorKind::IoFailure,
        }
    }

    pub(crate) fn unsupported(path: &Path, reason: impl Into<String>) -> Self {
        FsError::Unsupported {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Maps an I/O error on `path` onto the taxonomy.
pub(crate) fn io_error(path: &Path, err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_path_buf()),
        _ => FsError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

pub(crate) fn rename_error(from: &Path, to: &Path, err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::CrossesDevices => FsError::CrossDeviceMove {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        },
        _ => io_error(from, err),
    }
}

pub(crate) fn copy_error(from: &Path, to: &Path, err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(to.to_path_buf()),
        _ => FsError::CopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: err,
        },
    }
}

/// A failed step of a directory walk, attributed to the entry that failed.
pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> FsError {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(source) => io_error(&path, source),
        None => FsError::Io {
            path,
            source: io::Error::other("filesystem loop while walking"),
        },
    }
}

pub(crate) fn tree_error(root: &Path, err: ignore::Error) -> FsError {
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => io_error(root, source),
        None => FsError::Io {
            path: root.to_path_buf(),
            source: io::Error::other(message),
        },
    }
}

pub(crate) fn join_error(path: &Path, err: tokio::task::JoinError) -> FsError {
    FsError::Io {
        path: path.to_path_buf(),
        source: io::Error::other(err),
    }
}
