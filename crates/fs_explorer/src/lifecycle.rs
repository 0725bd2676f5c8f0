use crate::error::{FsError, Result, io_error, rename_error};
use crate::explorer::{copy_path, ensure_absent, ensure_unprotected};
use crate::types::{EmptyTrashOutcome, TrashEntry, file_timestamp};
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sandbox::{AuthorizedPath, PathSandbox, path_starts_with};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Lazy, one-shot listing of the trash directory.
pub type TrashStream = BoxStream<'static, Result<TrashEntry>>;

/// Soft-delete, backup and archive operations.
///
/// Works on paths that were already authorized. The trash directory lives
/// inside the first allowed root and is created by [`LifecycleManager::new`].
#[derive(Clone)]
pub struct LifecycleManager {
    pub(crate) sandbox: Arc<PathSandbox>,
    trash_dir: PathBuf,
}

impl LifecycleManager {
    pub async fn new(sandbox: Arc<PathSandbox>) -> Result<Self> {
        let trash_dir = sandbox.trash_dir().to_path_buf();
        tokio::fs::create_dir_all(&trash_dir)
            .await
            .map_err(|e| io_error(&trash_dir, e))?;
        debug!("Trash directory ready at {}", trash_dir.display());
        Ok(Self { sandbox, trash_dir })
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash_dir
    }

    /// Moves `path` into the trash and returns where it ended up.
    pub async fn move_to_trash(&self, path: &AuthorizedPath) -> Result<PathBuf> {
        ensure_unprotected(&self.sandbox, path)?;
        tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| io_error(path, e))?;

        let base = base_name(path)?;
        let destination = self
            .trash_dir
            .join(format!("{base}.{}", file_timestamp(Utc::now())));
        ensure_absent(&destination).await?;

        tokio::fs::rename(path, &destination)
            .await
            .map_err(|e| rename_error(path, &destination, e))?;
        info!("Moved {} to trash as {}", path, destination.display());
        Ok(destination)
    }

    /// Moves the trash entry `trash_name` back to `target`.
    ///
    /// `trash_name` must be a bare file name. An existing `target` is never
    /// replaced.
    pub async fn restore(&self, trash_name: &str, target: &AuthorizedPath) -> Result<PathBuf> {
        let entry = self.trash_entry_path(trash_name)?;
        tokio::fs::symlink_metadata(&entry)
            .await
            .map_err(|e| io_error(&entry, e))?;
        ensure_absent(target).await?;

        tokio::fs::rename(&entry, target)
            .await
            .map_err(|e| rename_error(&entry, target, e))?;
        info!("Restored {} to {}", trash_name, target);
        Ok(target.to_path_buf())
    }

    /// Streams the current trash contents. Every call reads the directory
    /// afresh; entries are yielded as they are read.
    pub fn list_trash(&self) -> TrashStream {
        let trash_dir = self.trash_dir.clone();

        stream::once(async move {
            let read_dir = tokio::fs::read_dir(&trash_dir)
                .await
                .map_err(|e| io_error(&trash_dir, e))?;
            Ok::<_, FsError>(stream::try_unfold(
                (read_dir, trash_dir),
                |(mut read_dir, trash_dir)| async move {
                    let Some(entry) = read_dir
                        .next_entry()
                        .await
                        .map_err(|e| io_error(&trash_dir, e))?
                    else {
                        return Ok(None);
                    };
                    let is_directory = match entry.file_type().await {
                        Ok(file_type) => file_type.is_dir(),
                        Err(err) => {
                            trace!("Cannot stat {}: {}", entry.path().display(), err);
                            false
                        }
                    };
                    let trash_entry = TrashEntry::from_name(
                        entry.file_name().to_string_lossy().into_owned(),
                        entry.path(),
                        is_directory,
                    );
                    Ok::<_, FsError>(Some((trash_entry, (read_dir, trash_dir))))
                },
            ))
        })
        .try_flatten()
        .boxed()
    }

    /// Collects [`list_trash`](Self::list_trash), ordered by name.
    pub async fn trash_entries(&self) -> Result<Vec<TrashEntry>> {
        let mut entries: Vec<TrashEntry> = self.list_trash().try_collect().await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Permanently deletes everything in the trash, but only if `confirm`.
    ///
    /// Deletions run concurrently. A failed entry is reported and does not
    /// stop the others; completed deletions are not undone.
    pub async fn empty_trash(&self, confirm: bool) -> Result<EmptyTrashOutcome> {
        let entries = self.trash_entries().await?;

        if !confirm {
            return Ok(EmptyTrashOutcome::ConfirmationRequired {
                pending: entries.len(),
            });
        }

        let results = join_all(entries.into_iter().map(|entry| async move {
            let removal = if entry.is_directory {
                tokio::fs::remove_dir_all(&entry.location).await
            } else {
                tokio::fs::remove_file(&entry.location).await
            };
            (entry.location, removal)
        }))
        .await;

        let mut removed = 0;
        let mut failures = Vec::new();
        for (location, result) in results {
            match result {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!("Failed to delete {}: {}", location.display(), err);
                    failures.push((location, err.to_string()));
                }
            }
        }

        info!("Emptied trash: {} removed, {} failed", removed, failures.len());
        Ok(EmptyTrashOutcome::Emptied { removed, failures })
    }

    /// Copies `source` into `dest_dir` as `<name>.<timestamp>.backup`.
    pub async fn backup(&self, source: &AuthorizedPath, dest_dir: &AuthorizedPath) -> Result<PathBuf> {
        let metadata = tokio::fs::metadata(dest_dir)
            .await
            .map_err(|e| io_error(dest_dir, e))?;
        if !metadata.is_dir() {
            return Err(FsError::unsupported(dest_dir, "backup destination is not a directory"));
        }

        let case = self.sandbox.config().case_sensitivity();
        if path_starts_with(dest_dir, source, case) {
            return Err(FsError::unsupported(dest_dir, "backup destination is inside the source"));
        }

        let base = base_name(source)?;
        let destination = dest_dir.join(format!("{base}.{}.backup", file_timestamp(Utc::now())));
        ensure_absent(&destination).await?;

        copy_path(source, &destination, false).await?;
        info!("Backed up {} to {}", source, destination.display());
        Ok(destination)
    }

    /// Copies `backup` over `destination`, replacing whatever is there.
    pub async fn restore_from_backup(
        &self,
        backup: &AuthorizedPath,
        destination: &AuthorizedPath,
    ) -> Result<()> {
        let backup_meta = tokio::fs::metadata(backup)
            .await
            .map_err(|e| io_error(backup, e))?;
        let case = self.sandbox.config().case_sensitivity();
        if path_starts_with(backup, destination, case) {
            return Err(FsError::unsupported(destination, "destination contains the backup"));
        }
        if path_starts_with(destination, backup, case) {
            return Err(FsError::unsupported(destination, "destination is inside the backup"));
        }
        ensure_unprotected(&self.sandbox, destination)?;

        if let Ok(existing) = tokio::fs::symlink_metadata(destination).await {
            // Directory restores start from an empty destination
            if existing.is_dir() || backup_meta.is_dir() {
                remove_path(destination, existing.is_dir()).await?;
            }
        }

        copy_path(backup, destination, true).await?;
        info!("Restored backup {} to {}", backup, destination);
        Ok(())
    }

    fn trash_entry_path(&self, trash_name: &str) -> Result<PathBuf> {
        let name = Path::new(trash_name);
        let mut components = name.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.trash_dir.join(name)),
            _ => {
                warn!("Rejected trash entry name {:?}", trash_name);
                Err(sandbox::SandboxError::AccessDenied {
                    path: name.to_path_buf(),
                    resolved: None,
                }
                .into())
            }
        }
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::unsupported(path, "path has no file name"))
}

async fn remove_path(path: &Path, is_dir: bool) -> Result<()> {
    let result = if is_dir {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| io_error(path, e))
}
