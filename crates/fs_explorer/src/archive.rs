use crate::error::{FsError, Result, io_error, join_error};
use crate::explorer::{Visit, walk_tree};
use crate::lifecycle::LifecycleManager;
use crate::types::{ArchiveReport, ExtractReport};
use sandbox::{AuthorizedPath, PathSandbox};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

impl LifecycleManager {
    /// Writes a zip archive of `source_dir` to `dest_archive`.
    ///
    /// The archive must not exist yet. Symlinks are skipped, never followed.
    /// A partially written archive is removed again on failure.
    pub async fn archive_directory(
        &self,
        source_dir: &AuthorizedPath,
        dest_archive: &AuthorizedPath,
    ) -> Result<ArchiveReport> {
        let source = source_dir.to_path_buf();
        let archive = dest_archive.to_path_buf();

        let report = tokio::task::spawn_blocking(move || write_archive(&source, &archive))
            .await
            .map_err(|e| join_error(source_dir, e))??;

        info!(
            "Archived {} into {} ({} files, {} directories)",
            source_dir,
            dest_archive,
            report.files,
            report.directories
        );
        Ok(report)
    }

    /// Unpacks the zip archive `source_archive` below `dest_dir`.
    ///
    /// Every entry is confined to `dest_dir` and authorized against the
    /// sandbox before anything is written; offending entries are listed in
    /// the report instead. Existing files are not replaced.
    pub async fn extract_archive(
        &self,
        source_archive: &AuthorizedPath,
        dest_dir: &AuthorizedPath,
    ) -> Result<ExtractReport> {
        let sandbox = self.sandbox.clone();
        let archive = source_archive.to_path_buf();
        let destination = dest_dir.to_path_buf();

        let report = tokio::task::spawn_blocking(move || {
            extract_entries(&sandbox, &archive, &destination)
        })
        .await
        .map_err(|e| join_error(source_archive, e))??;

        info!(
            "Extracted {} files into {} ({} rejected)",
            report.extracted.len(),
            dest_dir,
            report.rejected.len()
        );
        Ok(report)
    }
}

fn archive_error(path: &Path, source: zip::result::ZipError) -> FsError {
    FsError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

fn write_archive(source: &Path, archive: &Path) -> Result<ArchiveReport> {
    let metadata = fs::metadata(source).map_err(|e| io_error(source, e))?;
    if !metadata.is_dir() {
        return Err(FsError::unsupported(source, "not a directory"));
    }

    let file = fs::File::create_new(archive).map_err(|e| io_error(archive, e))?;
    let result = fill_archive(file, source, archive);
    if result.is_err() {
        if let Err(err) = fs::remove_file(archive) {
            warn!("Could not remove partial archive {}: {}", archive.display(), err);
        }
    }
    result
}

fn fill_archive(file: fs::File, source: &Path, archive: &Path) -> Result<ArchiveReport> {
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut report = ArchiveReport {
        archive: archive.to_path_buf(),
        ..Default::default()
    };

    let mut entries = Vec::new();
    walk_tree(source, |path, relative, file_type| {
        if path == archive {
            return Visit::Skip;
        }
        if file_type.is_symlink() {
            report.skipped.push(path.to_path_buf());
            return Visit::Skip;
        }
        entries.push((path.to_path_buf(), entry_name(relative), file_type.is_dir()));
        Visit::Descend
    })?;

    for (path, name, is_dir) in entries {
        if is_dir {
            writer
                .add_directory(name, options)
                .map_err(|e| archive_error(archive, e))?;
            report.directories += 1;
        } else {
            writer
                .start_file(name, options)
                .map_err(|e| archive_error(archive, e))?;
            let mut reader = fs::File::open(&path).map_err(|e| io_error(&path, e))?;
            io::copy(&mut reader, &mut writer).map_err(|e| io_error(&path, e))?;
            report.files += 1;
        }
    }

    writer.finish().map_err(|e| archive_error(archive, e))?;
    Ok(report)
}

/// Zip entry names always use `/`.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits an entry name into plain segments, or explains why it may not be
/// written below the destination.
fn confined_segments(name: &str) -> std::result::Result<Vec<&OsStr>, &'static str> {
    let mut segments = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => segments.push(segment),
            Component::CurDir => {}
            Component::ParentDir => return Err("entry path contains '..'"),
            Component::RootDir | Component::Prefix(_) => return Err("entry path is absolute"),
        }
    }
    if segments.is_empty() {
        return Err("entry path is empty");
    }
    Ok(segments)
}

/// Authorizes `path` and checks it still resolves below `dest_dir`.
fn authorize_below(
    sandbox: &PathSandbox,
    dest_dir: &Path,
    path: &Path,
) -> std::result::Result<AuthorizedPath, String> {
    let authorized = sandbox.authorize(path).map_err(|e| e.to_string())?;
    if !authorized.starts_with(dest_dir) {
        return Err(format!(
            "entry resolves outside the destination: {}",
            authorized
        ));
    }
    Ok(authorized)
}

/// Creates `path` unless a directory is already there. `Ok(false)` means
/// something other than a directory occupies the name.
fn ensure_directory(path: &Path) -> io::Result<bool> {
    match fs::create_dir(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(path.is_dir()),
        Err(err) => Err(err),
    }
}

fn extract_entries(sandbox: &PathSandbox, archive: &Path, dest_dir: &Path) -> Result<ExtractReport> {
    let metadata = fs::metadata(dest_dir).map_err(|e| io_error(dest_dir, e))?;
    if !metadata.is_dir() {
        return Err(FsError::unsupported(dest_dir, "not a directory"));
    }

    let file = fs::File::open(archive).map_err(|e| io_error(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;
    let mut report = ExtractReport::default();

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| archive_error(archive, e))?;
        let name = entry.name().to_string();

        let mut reject = |reason: String| {
            warn!("Rejected archive entry {:?}: {}", name, reason);
            report.rejected.push((name.clone(), reason));
        };

        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            reject("symbolic links are not extracted".to_string());
            continue;
        }

        let segments = match confined_segments(&name) {
            Ok(segments) => segments,
            Err(reason) => {
                reject(reason.to_string());
                continue;
            }
        };

        // Authorize and create every missing ancestor top-down
        let mut current = dest_dir.to_path_buf();
        let mut ancestors_ok = true;
        for segment in &segments[..segments.len() - 1] {
            current.push(segment);
            match authorize_below(sandbox, dest_dir, &current) {
                Ok(authorized) => match ensure_directory(&authorized) {
                    Ok(true) => {}
                    Ok(false) => {
                        reject(format!("{} is not a directory", authorized));
                        ancestors_ok = false;
                        break;
                    }
                    Err(err) => return Err(io_error(&authorized, err)),
                },
                Err(reason) => {
                    reject(reason);
                    ancestors_ok = false;
                    break;
                }
            }
        }
        if !ancestors_ok {
            continue;
        }

        let target: PathBuf = segments.iter().fold(dest_dir.to_path_buf(), |path, s| path.join(s));
        let authorized = match authorize_below(sandbox, dest_dir, &target) {
            Ok(authorized) => authorized,
            Err(reason) => {
                reject(reason);
                continue;
            }
        };

        if entry.is_dir() {
            match ensure_directory(&authorized) {
                Ok(true) => report.directories += 1,
                Ok(false) => reject(format!("{} is not a directory", authorized)),
                Err(err) => return Err(io_error(&authorized, err)),
            }
            continue;
        }

        let mut output = match fs::File::create_new(&authorized) {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                reject("destination file already exists".to_string());
                continue;
            }
            Err(err) => return Err(io_error(&authorized, err)),
        };
        io::copy(&mut entry, &mut output).map_err(|e| io_error(&authorized, e))?;
        debug!("Extracted {}", authorized);
        report.extracted.push(authorized.into_path_buf());
    }

    Ok(report)
}
