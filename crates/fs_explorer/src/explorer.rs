use crate::error::{
    FsError, Result, copy_error, io_error, join_error, rename_error, tree_error, walk_error,
};
use crate::types::{
    ContentMatch, DirEntryInfo, FileInfo, FileSystemEntryType, FileTreeEntry, SearchMode,
    SearchOptions,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use ignore::WalkBuilder;
use regex::RegexBuilder;
use sandbox::{AuthorizedPath, PathSandbox, path_starts_with};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Plain file operations on authorized paths.
///
/// Every method takes [`AuthorizedPath`]s; authorizing caller input is the
/// caller's job. Walks never follow symlinks.
#[derive(Clone)]
pub struct Explorer {
    sandbox: Arc<PathSandbox>,
}

impl Explorer {
    pub fn new(sandbox: Arc<PathSandbox>) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// Reads a UTF-8 text file. Binary content is refused.
    pub async fn read_file(&self, path: &AuthorizedPath) -> Result<String> {
        debug!("Reading file: {}", path);
        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;

        if content_inspector::inspect(&bytes).is_binary() {
            return Err(FsError::unsupported(path, "not a text file"));
        }

        String::from_utf8(bytes).map_err(|_| FsError::unsupported(path, "not valid UTF-8"))
    }

    /// Reads all files concurrently. One failure does not affect the others.
    pub async fn read_files(&self, paths: &[AuthorizedPath]) -> Vec<Result<String>> {
        join_all(paths.iter().map(|path| self.read_file(path))).await
    }

    /// Creates or truncates `path`. The parent must already exist.
    pub async fn write_file(&self, path: &AuthorizedPath, content: &str) -> Result<()> {
        debug!("Writing file: {} ({} bytes)", path, content.len());
        tokio::fs::write(path, content)
            .await
            .map_err(|e| io_error(path, e))
    }

    /// Creates the directory and any missing ancestors; succeeds if it exists.
    pub async fn create_directory(&self, path: &AuthorizedPath) -> Result<()> {
        debug!("Creating directory: {}", path);
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| io_error(path, e))
    }

    /// Immediate children, directories first.
    pub async fn list_directory(&self, path: &AuthorizedPath) -> Result<Vec<DirEntryInfo>> {
        let mut read_dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| io_error(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| io_error(path, e))?
        {
            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(err) => {
                    trace!("Cannot stat {}: {}", entry.path().display(), err);
                    false
                }
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                entry_type: entry_type(is_dir),
            });
        }

        entries.sort_by(|a, b| (a.entry_type, &a.name).cmp(&(b.entry_type, &b.name)));
        Ok(entries)
    }

    /// Builds a tree below `path`, expanding at most `max_depth` levels.
    pub async fn directory_tree(
        &self,
        path: &AuthorizedPath,
        max_depth: usize,
    ) -> Result<FileTreeEntry> {
        let root = path.to_path_buf();
        tokio::task::spawn_blocking(move || build_tree(&root, max_depth))
            .await
            .map_err(|e| join_error(path, e))?
    }

    /// Renames `source` to `destination`, refusing to replace anything.
    pub async fn move_file(
        &self,
        source: &AuthorizedPath,
        destination: &AuthorizedPath,
    ) -> Result<()> {
        debug!("Moving {} to {}", source, destination);
        ensure_unprotected(&self.sandbox, source)?;
        ensure_absent(destination).await?;
        tokio::fs::rename(source, destination)
            .await
            .map_err(|e| rename_error(source, destination, e))
    }

    /// Copies a file or a whole directory, refusing to replace anything.
    pub async fn copy_file(
        &self,
        source: &AuthorizedPath,
        destination: &AuthorizedPath,
    ) -> Result<u64> {
        debug!("Copying {} to {}", source, destination);
        let case = self.sandbox.config().case_sensitivity();
        if path_starts_with(destination, source, case) {
            return Err(FsError::unsupported(
                destination,
                "cannot copy a path into itself",
            ));
        }
        ensure_absent(destination).await?;
        copy_path(source, destination, false).await
    }

    /// Case-insensitive file-name search below `root`.
    ///
    /// `exclude_patterns` are glob patterns matched against the path relative
    /// to `root` and against the bare file name.
    pub async fn search_files(
        &self,
        root: &AuthorizedPath,
        pattern: &str,
        exclude_patterns: &[String],
    ) -> Result<Vec<PathBuf>> {
        let excludes = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| FsError::unsupported(root, format!("invalid exclude pattern: {e}")))?;
        let needle = pattern.to_lowercase();
        let root_path = root.to_path_buf();
        let sandbox = self.sandbox.clone();

        tokio::task::spawn_blocking(move || {
            let mut matches = Vec::new();
            walk_tree(&root_path, |path, relative, _file_type| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                let excluded = excludes.iter().any(|exclude| {
                    exclude.matches_path(relative) || exclude.matches(&name)
                });
                if excluded {
                    return Visit::Skip;
                }
                if name.contains(&needle) && sandbox.is_allowed(path) {
                    matches.push(path.to_path_buf());
                }
                Visit::Descend
            })?;
            matches.sort();
            Ok(matches)
        })
        .await
        .map_err(|e| join_error(root, e))?
    }

    /// Searches file contents below `root` (or in `root` itself if it is a
    /// file). Binary files are skipped.
    pub async fn grep_files(
        &self,
        root: &AuthorizedPath,
        options: SearchOptions,
    ) -> Result<Vec<ContentMatch>> {
        let pattern = match options.mode {
            SearchMode::Exact => regex::escape(&options.query),
            SearchMode::Regex => options.query.clone(),
        };
        let pattern = if options.whole_words {
            format!(r"\b{pattern}\b")
        } else {
            pattern
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|e| FsError::unsupported(root, format!("invalid search pattern: {e}")))?;
        let max_results = options.max_results.unwrap_or(usize::MAX);
        let root_path = root.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            if root_path.is_file() {
                files.push(root_path.clone());
            } else {
                // Symlinks are skipped, reading one would follow it
                walk_tree(&root_path, |path, _relative, file_type| {
                    if file_type.is_file() {
                        files.push(path.to_path_buf());
                    }
                    Visit::Descend
                })?;
                files.sort();
            }

            let mut results = Vec::new();
            for file in files {
                let Ok(bytes) = fs::read(&file) else {
                    trace!("Skipping unreadable file {}", file.display());
                    continue;
                };
                if content_inspector::inspect(&bytes).is_binary() {
                    continue;
                }
                let content = String::from_utf8_lossy(&bytes);
                for (index, line) in content.lines().enumerate() {
                    if regex.is_match(line) {
                        results.push(ContentMatch {
                            file: file.clone(),
                            line_number: index + 1,
                            line: line.to_string(),
                        });
                        if results.len() >= max_results {
                            return Ok(results);
                        }
                    }
                }
            }
            Ok(results)
        })
        .await
        .map_err(|e| join_error(root, e))?
    }

    pub async fn file_info(&self, path: &AuthorizedPath) -> Result<FileInfo> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| io_error(path, e))?;

        Ok(FileInfo {
            path: path.to_path_buf(),
            size: metadata.len(),
            entry_type: entry_type(metadata.is_dir()),
            created: metadata.created().ok().map(to_utc),
            modified: metadata.modified().ok().map(to_utc),
            accessed: metadata.accessed().ok().map(to_utc),
            permissions: permissions_string(&metadata),
        })
    }
}

fn entry_type(is_dir: bool) -> FileSystemEntryType {
    if is_dir {
        FileSystemEntryType::Directory
    } else {
        FileSystemEntryType::File
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

#[cfg(unix)]
fn permissions_string(metadata: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions_string(metadata: &fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "readonly".to_string()
    } else {
        "writable".to_string()
    }
}

pub(crate) async fn ensure_absent(path: &Path) -> Result<()> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| io_error(path, e))?;
    // A dangling symlink reports as absent but would still be replaced
    let is_link = tokio::fs::symlink_metadata(path).await.is_ok();
    if exists || is_link {
        return Err(FsError::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

/// Refuses allowed roots, the trash directory, its ancestors and anything
/// inside it.
pub(crate) fn ensure_unprotected(sandbox: &PathSandbox, path: &Path) -> Result<()> {
    let case = sandbox.config().case_sensitivity();
    let trash_dir = sandbox.trash_dir();
    let is_root = sandbox
        .roots()
        .iter()
        .any(|root| path_starts_with(root, path, case));
    let touches_trash =
        path_starts_with(trash_dir, path, case) || path_starts_with(path, trash_dir, case);

    if is_root || touches_trash {
        warn!("Refusing to modify protected path {}", path.display());
        return Err(FsError::Protected(path.to_path_buf()));
    }
    Ok(())
}

/// Copies `source` to `destination`. Directories are copied recursively.
///
/// With `overwrite == false` nothing at `destination` is ever replaced.
pub(crate) async fn copy_path(source: &Path, destination: &Path, overwrite: bool) -> Result<u64> {
    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|e| io_error(source, e))?;

    if metadata.is_dir() {
        let (from, to) = (source.to_path_buf(), destination.to_path_buf());
        return tokio::task::spawn_blocking(move || copy_tree(&from, &to, overwrite))
            .await
            .map_err(|e| join_error(source, e))?;
    }

    if overwrite {
        return tokio::fs::copy(source, destination)
            .await
            .map_err(|e| copy_error(source, destination, e));
    }

    let mut reader = tokio::fs::File::open(source)
        .await
        .map_err(|e| io_error(source, e))?;
    let mut writer = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await
        .map_err(|e| copy_error(source, destination, e))?;
    let copied = tokio::io::copy(&mut reader, &mut writer)
        .await
        .map_err(|e| copy_error(source, destination, e))?;
    writer
        .sync_all()
        .await
        .map_err(|e| copy_error(source, destination, e))?;
    Ok(copied)
}

fn copy_tree(source: &Path, destination: &Path, overwrite: bool) -> Result<u64> {
    make_dir(source, destination, overwrite)?;

    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| walk_error(source, e))?;
        let from = entry.path();
        let Ok(relative) = from.strip_prefix(source) else {
            continue;
        };
        let to = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            debug!("Not copying symlink {}", from.display());
        } else if file_type.is_dir() {
            make_dir(from, &to, overwrite)?;
        } else if overwrite {
            copied += fs::copy(from, &to).map_err(|e| copy_error(from, &to, e))?;
        } else {
            let mut reader = fs::File::open(from).map_err(|e| io_error(from, e))?;
            let mut writer = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&to)
                .map_err(|e| copy_error(from, &to, e))?;
            copied += io::copy(&mut reader, &mut writer).map_err(|e| copy_error(from, &to, e))?;
        }
    }

    Ok(copied)
}

fn make_dir(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    match fs::create_dir(to) {
        Ok(()) => Ok(()),
        Err(err) if overwrite && err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(copy_error(from, to, err)),
    }
}

pub(crate) enum Visit {
    Descend,
    Skip,
}

/// Depth-first walk below `root`, siblings in name order.
///
/// `visit` gets the path, the path relative to `root` and the entry's own
/// file type. Symlinks are reported as such and never followed. Returning
/// [`Visit::Skip`] for a directory leaves its contents out.
pub(crate) fn walk_tree<F>(root: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(&Path, &Path, fs::FileType) -> Visit,
{
    let mut entries = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let file_type = entry.file_type();

        if let Visit::Skip = visit(path, relative, file_type) {
            if file_type.is_dir() {
                entries.skip_current_dir();
            }
        }
    }

    Ok(())
}

fn build_tree(path: &Path, max_depth: usize) -> Result<FileTreeEntry> {
    let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
    let mut root = FileTreeEntry {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        entry_type: entry_type(metadata.is_dir()),
        children: BTreeMap::new(),
        is_expanded: metadata.is_dir() && max_depth > 0,
    };
    if !root.is_expanded {
        return Ok(root);
    }

    let walker = WalkBuilder::new(path)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(Some(max_depth))
        .build();

    // Parents are always yielded before their children
    'entries: for result in walker {
        let dir_entry = result.map_err(|e| tree_error(path, e))?;
        if dir_entry.depth() == 0 {
            continue;
        }
        let Ok(relative) = dir_entry.path().strip_prefix(path) else {
            continue;
        };
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(name) = segments.pop() else {
            continue;
        };

        let mut parent = &mut root;
        for segment in &segments {
            parent = match parent.children.get_mut(segment) {
                Some(child) => child,
                None => continue 'entries,
            };
        }

        let is_dir = dir_entry.file_type().is_some_and(|t| t.is_dir());
        parent.children.insert(
            name.clone(),
            FileTreeEntry {
                name,
                entry_type: entry_type(is_dir),
                children: BTreeMap::new(),
                is_expanded: is_dir && dir_entry.depth() < max_depth,
            },
        );
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsErrorKind;
    use sandbox::{CaseSensitivity, SandboxConfig, TRASH_DIR_NAME};
    #[cfg(unix)]
    use std::os::unix::fs as unix_fs;
    use tempfile::TempDir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn setup_test_directory() -> std::result::Result<(TempDir, PathBuf, Explorer), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        let config = SandboxConfig::new([&root])?
            .with_case_sensitivity(CaseSensitivity::Sensitive)
            .with_working_dir(&root);
        let explorer = Explorer::new(Arc::new(PathSandbox::new(config)));
        Ok((temp_dir, root, explorer))
    }

    fn authorize(explorer: &Explorer, path: &Path) -> AuthorizedPath {
        explorer.sandbox().authorize(path).expect("path inside sandbox")
    }

    #[tokio::test]
    async fn test_write_then_read() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        let path = authorize(&explorer, &root.join("hello.txt"));

        explorer.write_file(&path, "Hello, World!").await?;
        let path = authorize(&explorer, &root.join("hello.txt"));
        assert_eq!(explorer.read_file(&path).await?, "Hello, World!");
        Ok(())
    }

    #[tokio::test]
    async fn test_read_refuses_binary() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::write(root.join("blob.bin"), [0u8, 159, 146, 150, 0, 1, 2])?;

        let err = explorer
            .read_file(&authorize(&explorer, &root.join("blob.bin")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a text file"));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_files_collects_failures_per_file() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::write(root.join("a.txt"), "A")?;
        fs::write(root.join("b.txt"), "B")?;

        let paths = vec![
            authorize(&explorer, &root.join("a.txt")),
            authorize(&explorer, &root.join("missing.txt")),
            authorize(&explorer, &root.join("b.txt")),
        ];
        let results = explorer.read_files(&paths).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().ok().map(String::as_str), Some("A"));
        assert_eq!(
            results[1].as_ref().map_err(FsError::kind).unwrap_err(),
            FsErrorKind::NotFound
        );
        assert_eq!(results[2].as_ref().ok().map(String::as_str), Some("B"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_directory_orders_directories_first() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir(root.join("zeta"))?;
        fs::write(root.join("alpha.txt"), "a")?;

        let entries = explorer
            .list_directory(&authorize(&explorer, &root))
            .await?;
        let rendered: Vec<String> = entries.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["[DIR] zeta", "[FILE] alpha.txt"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_directory_tree_respects_depth() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir_all(root.join("dir1").join("nested"))?;
        fs::write(root.join("dir1").join("file2.txt"), "x")?;
        fs::write(root.join("file1.txt"), "x")?;

        let tree = explorer
            .directory_tree(&authorize(&explorer, &root), 1)
            .await?;
        assert!(tree.is_expanded);
        let dir1 = &tree.children["dir1"];
        assert_eq!(dir1.entry_type, FileSystemEntryType::Directory);
        assert!(!dir1.is_expanded);
        assert!(tree.children.contains_key("file1.txt"));

        let tree = explorer
            .directory_tree(&authorize(&explorer, &root), 2)
            .await?;
        assert!(tree.children["dir1"].children.contains_key("file2.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_move_refuses_existing_destination() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::write(root.join("a.txt"), "a")?;
        fs::write(root.join("b.txt"), "b")?;

        let err = explorer
            .move_file(
                &authorize(&explorer, &root.join("a.txt")),
                &authorize(&explorer, &root.join("b.txt")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(root.join("b.txt"))?, "b");

        explorer
            .move_file(
                &authorize(&explorer, &root.join("a.txt")),
                &authorize(&explorer, &root.join("c.txt")),
            )
            .await?;
        assert!(!root.join("a.txt").exists());
        assert_eq!(fs::read_to_string(root.join("c.txt"))?, "a");
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_refuses_existing_destination() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::write(root.join("a.txt"), "a")?;
        fs::write(root.join("b.txt"), "b")?;

        let err = explorer
            .copy_file(
                &authorize(&explorer, &root.join("a.txt")),
                &authorize(&explorer, &root.join("b.txt")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(root.join("b.txt"))?, "b");
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_directory_recursively() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir_all(root.join("src").join("inner"))?;
        fs::write(root.join("src").join("top.txt"), "top")?;
        fs::write(root.join("src").join("inner").join("deep.txt"), "deep")?;

        explorer
            .copy_file(
                &authorize(&explorer, &root.join("src")),
                &authorize(&explorer, &root.join("dst")),
            )
            .await?;

        assert_eq!(fs::read_to_string(root.join("dst").join("top.txt"))?, "top");
        assert_eq!(
            fs::read_to_string(root.join("dst").join("inner").join("deep.txt"))?,
            "deep"
        );
        assert!(root.join("src").join("top.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_files_by_name_with_excludes() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir_all(root.join("src").join("nested"))?;
        fs::create_dir_all(root.join("target"))?;
        fs::write(root.join("Report.md"), "x")?;
        fs::write(root.join("src").join("nested").join("report_2.txt"), "x")?;
        fs::write(root.join("target").join("report.bin"), "x")?;
        fs::write(root.join("notes.txt"), "x")?;

        let results = explorer
            .search_files(
                &authorize(&explorer, &root),
                "report",
                &["target".to_string()],
            )
            .await?;

        assert_eq!(
            results,
            vec![
                root.join("Report.md"),
                root.join("src").join("nested").join("report_2.txt"),
            ]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_does_not_follow_symlinks_out_of_the_root() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        let outside = TempDir::new()?;
        fs::write(outside.path().join("secret-match.txt"), "x")?;
        unix_fs::symlink(outside.path(), root.join("link"))?;

        let results = explorer
            .search_files(&authorize(&explorer, &root), "secret", &[])
            .await?;
        assert!(results.is_empty(), "unexpected results: {results:?}");
        Ok(())
    }

    #[tokio::test]
    async fn test_grep_files() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir(root.join("subdir"))?;
        fs::write(
            root.join("file1.txt"),
            "This is line 1\nThis is line 2\nThis is line 3",
        )?;
        fs::write(root.join("file2.txt"), "Another file line 1\nAnother file line 2")?;
        fs::write(root.join("subdir").join("file3.txt"), "Subdir line 1\nSubdir LINE 2")?;

        let results = explorer
            .grep_files(
                &authorize(&explorer, &root),
                SearchOptions {
                    query: "line 2".to_string(),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|m| m.line_number == 2));

        let results = explorer
            .grep_files(
                &authorize(&explorer, &root),
                SearchOptions {
                    query: "line 2".to_string(),
                    case_sensitive: true,
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(results.len(), 2);

        let results = explorer
            .grep_files(
                &authorize(&explorer, &root),
                SearchOptions {
                    query: r"line \d".to_string(),
                    mode: SearchMode::Regex,
                    max_results: Some(4),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(results.len(), 4);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_grep_does_not_read_through_symlinks() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        let outside = TempDir::new()?;
        fs::write(outside.path().join("secret.txt"), "TOPSECRET password=hunter2")?;
        fs::create_dir(outside.path().join("nested"))?;
        fs::write(outside.path().join("nested").join("more.txt"), "password=again")?;
        unix_fs::symlink(outside.path().join("secret.txt"), root.join("innocent.txt"))?;
        unix_fs::symlink(outside.path().join("nested"), root.join("linked_dir"))?;
        fs::write(root.join("local.txt"), "no password here")?;

        let results = explorer
            .grep_files(
                &authorize(&explorer, &root),
                SearchOptions {
                    query: "password".to_string(),
                    ..Default::default()
                },
            )
            .await?;
        let files: Vec<PathBuf> = results.into_iter().map(|m| m.file).collect();
        assert_eq!(files, vec![root.join("local.txt")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_directory_into_itself_is_refused() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir(root.join("a"))?;
        fs::write(root.join("a").join("f.txt"), "f")?;

        let err = explorer
            .copy_file(
                &authorize(&explorer, &root.join("a")),
                &authorize(&explorer, &root.join("a").join("b")),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("into itself"), "{err}");
        assert!(!root.join("a").join("b").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_move_refuses_protected_sources() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir(root.join(TRASH_DIR_NAME))?;
        fs::write(root.join(TRASH_DIR_NAME).join("kept.txt"), "kept")?;

        for protected in [
            root.join(TRASH_DIR_NAME),
            root.join(TRASH_DIR_NAME).join("kept.txt"),
        ] {
            let err = explorer
                .move_file(
                    &authorize(&explorer, &protected),
                    &authorize(&explorer, &root.join("moved")),
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FsErrorKind::AccessDenied, "{}", protected.display());
            assert!(protected.exists());
        }
        assert!(!root.join("moved").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_directory_tree_skips_nothing_hidden() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::create_dir_all(root.join("target").join("debug"))?;
        fs::write(root.join(".env"), "x")?;
        fs::write(root.join(".gitignore"), "target\n")?;

        let tree = explorer
            .directory_tree(&authorize(&explorer, &root), 3)
            .await?;
        assert!(tree.children.contains_key(".env"));
        assert!(tree.children["target"].children.contains_key("debug"));
        assert!(tree.children["target"].children["debug"].is_expanded);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_info() -> TestResult {
        let (_temp, root, explorer) = setup_test_directory()?;
        fs::write(root.join("sized.txt"), "12345")?;

        let info = explorer
            .file_info(&authorize(&explorer, &root.join("sized.txt")))
            .await?;
        assert_eq!(info.size, 5);
        assert_eq!(info.entry_type, FileSystemEntryType::File);
        assert!(info.modified.is_some());
        Ok(())
    }
}
