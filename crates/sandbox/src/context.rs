use crate::path::expand_home;
use crate::{CaseSensitivity, SandboxError};
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the soft-delete directory created inside the first allowed root.
pub const TRASH_DIR_NAME: &str = ".trash";

/// Immutable description of what a sandbox may touch.
///
/// Roots are validated and canonicalized once, in the order given. The first
/// root also hosts the trash directory.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    roots: Vec<PathBuf>,
    trash_dir: PathBuf,
    case_sensitivity: CaseSensitivity,
    home_dir: Option<PathBuf>,
    working_dir: PathBuf,
}

impl SandboxConfig {
    /// Validates every root: it must exist and be a directory.
    ///
    /// # Errors
    /// `NoRoots` for an empty list, `InvalidRoot` for the first root that is
    /// missing or not a directory.
    pub fn new<I, P>(roots: I) -> Result<Self, SandboxError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let home_dir = dirs::home_dir();
        let working_dir = std::env::current_dir().map_err(SandboxError::WorkingDirectory)?;

        let roots = roots
            .into_iter()
            .map(|root| validate_root(root.as_ref(), home_dir.as_deref(), &working_dir))
            .collect::<Result<Vec<_>, _>>()?;

        let first = roots.first().ok_or(SandboxError::NoRoots)?;
        let trash_dir = first.join(TRASH_DIR_NAME);

        Ok(Self {
            roots,
            trash_dir,
            case_sensitivity: CaseSensitivity::default(),
            home_dir,
            working_dir,
        })
    }

    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    /// Overrides the directory `~` expands to in candidate paths.
    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    /// Overrides the directory relative candidate paths resolve against.
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into().clean();
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

fn validate_root(
    root: &Path,
    home_dir: Option<&Path>,
    working_dir: &Path,
) -> Result<PathBuf, SandboxError> {
    let expanded = expand_home(root, home_dir);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        working_dir.join(expanded)
    };

    let canonical = absolute
        .clean()
        .canonicalize()
        .map_err(|err| SandboxError::InvalidRoot {
            path: root.to_path_buf(),
            reason: err.to_string(),
        })?;

    if !canonical.is_dir() {
        return Err(SandboxError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    debug!("Registered allowed root {}", canonical.display());
    Ok(canonical)
}
