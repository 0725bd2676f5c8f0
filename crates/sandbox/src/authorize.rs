use crate::path::{expand_home, is_under_any_root};
use crate::{SandboxConfig, SandboxError};
use path_clean::PathClean;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// A path proven to lie under one of the allowed roots at the time it was
/// authorized.
///
/// Existing targets are fully symlink-resolved. Targets that do not exist yet
/// are absolute and normalized but unresolved. Only [`PathSandbox`] can create
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizedPath(PathBuf);

impl AuthorizedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for AuthorizedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for AuthorizedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for AuthorizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Decides, for every caller-supplied path, whether it may be touched.
///
/// Nothing is cached: every call re-resolves against the filesystem as it is
/// now. Authorization never mutates the filesystem.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    config: SandboxConfig,
}

impl PathSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.config.roots()
    }

    pub fn trash_dir(&self) -> &Path {
        self.config.trash_dir()
    }

    /// Returns whether an absolute, normalized path lies under an allowed root.
    pub fn is_allowed(&self, path: &Path) -> bool {
        is_under_any_root(path, self.config.roots(), self.config.case_sensitivity())
    }

    /// Resolves `candidate` and checks it against the allowed roots.
    ///
    /// # Errors
    /// `AccessDenied` when the path, its symlink-resolved form, or the
    /// resolved parent of a not-yet-existing target falls outside every root.
    /// `ParentMissing` when neither the target nor its parent exists.
    pub fn authorize(&self, candidate: impl AsRef<Path>) -> Result<AuthorizedPath, SandboxError> {
        let candidate = candidate.as_ref();
        let expanded = expand_home(candidate, self.config.home_dir());
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.config.working_dir().join(expanded)
        };
        let normalized = absolute.clean();

        if !self.is_allowed(&normalized) {
            warn!(
                "Rejected path outside allowed roots. Requested: {} | Normalized: {}",
                candidate.display(),
                normalized.display()
            );
            return Err(SandboxError::denied(&normalized, None));
        }

        match normalized.canonicalize() {
            Ok(real) => {
                if !self.is_allowed(&real) {
                    warn!(
                        "Rejected symlink escape. Requested: {} | Resolved: {}",
                        normalized.display(),
                        real.display()
                    );
                    return Err(SandboxError::denied(&normalized, Some(&real)));
                }
                trace!("Authorized existing path {}", real.display());
                Ok(AuthorizedPath(real))
            }
            Err(err) => {
                trace!(
                    "Could not resolve {} ({}), checking parent",
                    normalized.display(),
                    err
                );
                self.authorize_new_target(normalized)
            }
        }
    }

    fn authorize_new_target(&self, normalized: PathBuf) -> Result<AuthorizedPath, SandboxError> {
        // The entry exists but cannot be resolved (dangling symlink, loop):
        // writing through it would land wherever it points.
        if normalized.symlink_metadata().is_ok() {
            warn!(
                "Rejected unresolvable existing entry {}",
                normalized.display()
            );
            return Err(SandboxError::denied(&normalized, None));
        }

        let Some(parent) = normalized.parent() else {
            return Err(SandboxError::denied(&normalized, None));
        };

        let real_parent = parent
            .canonicalize()
            .map_err(|_| SandboxError::ParentMissing {
                path: normalized.clone(),
                parent: parent.to_path_buf(),
            })?;

        if !self.is_allowed(&real_parent) {
            warn!(
                "Rejected new path whose parent escapes. Requested: {} | Parent resolves to: {}",
                normalized.display(),
                real_parent.display()
            );
            return Err(SandboxError::denied(&normalized, Some(&real_parent)));
        }

        trace!("Authorized new path {}", normalized.display());
        Ok(AuthorizedPath(normalized))
    }
}
