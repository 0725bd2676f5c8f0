use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Formats `time` the way trash and backup names embed it: ISO-8601 UTC with
/// millisecond precision and every `:` and `.` replaced by `-`.
pub fn file_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Inverse of [`file_timestamp`].
pub fn parse_file_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    // 2024-05-01T10-20-30-123Z
    if stamp.len() != 24 || !stamp.is_ascii() {
        return None;
    }
    let mut iso = stamp.as_bytes().to_vec();
    iso[13] = b':';
    iso[16] = b':';
    iso[19] = b'.';
    let iso = String::from_utf8(iso).ok()?;
    DateTime::parse_from_rfc3339(&iso)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// Something sitting in the trash directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrashEntry {
    /// File name inside the trash directory, `<original>.<timestamp>`
    pub name: String,
    /// Base name the entry had before it was trashed
    pub original_name: String,
    /// `None` when the name does not follow the trash naming convention
    pub trashed_at: Option<DateTime<Utc>>,
    pub location: PathBuf,
    pub is_directory: bool,
}

impl TrashEntry {
    pub fn from_name(name: String, location: PathBuf, is_directory: bool) -> Self {
        let parsed = name
            .rsplit_once('.')
            .and_then(|(original, stamp)| {
                parse_file_timestamp(stamp).map(|time| (original.to_string(), time))
            });
        let (original_name, trashed_at) = match parsed {
            Some((original, time)) => (original, Some(time)),
            None => (name.clone(), None),
        };
        Self {
            name,
            original_name,
            trashed_at,
            location,
            is_directory,
        }
    }
}

/// Result of an empty-trash request.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyTrashOutcome {
    /// Nothing was deleted because the caller did not confirm.
    ConfirmationRequired { pending: usize },
    Emptied {
        removed: usize,
        failures: Vec<(PathBuf, String)>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveReport {
    pub archive: PathBuf,
    pub files: usize,
    pub directories: usize,
    /// Symlinks are never followed into the archive
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractReport {
    pub extracted: Vec<PathBuf>,
    pub directories: usize,
    /// Entry name and the reason it was not written
    pub rejected: Vec<(String, String)>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileSystemEntryType {
    Directory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirEntryInfo {
    pub name: String,
    pub entry_type: FileSystemEntryType,
}

impl fmt::Display for DirEntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry_type {
            FileSystemEntryType::Directory => write!(f, "[DIR] {}", self.name),
            FileSystemEntryType::File => write!(f, "[FILE] {}", self.name),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileTreeEntry {
    pub name: String,
    pub entry_type: FileSystemEntryType,
    pub children: BTreeMap<String, FileTreeEntry>,
    pub is_expanded: bool,
}

impl fmt::Display for FileTreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0, "")
    }
}

impl FileTreeEntry {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, level: usize, prefix: &str) -> fmt::Result {
        if level == 0 {
            writeln!(f, "{}/", self.name)?;
        } else {
            write!(f, "{prefix}{}", self.name)?;
            if self.entry_type == FileSystemEntryType::Directory {
                f.write_str("/")?;
                if !self.is_expanded {
                    f.write_str(" [...]")?;
                }
            }
            writeln!(f)?;
        }

        if self.entry_type != FileSystemEntryType::Directory || !self.is_expanded {
            return Ok(());
        }

        // Directories first, then files, each alphabetically
        let mut children: Vec<_> = self.children.values().collect();
        children.sort_by_key(|child| (child.entry_type, &child.name));

        let continuation = prefix.replace("├─ ", "│  ").replace("└─ ", "   ");
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let branch = if i + 1 == count { "└─ " } else { "├─ " };
            child.write_tree(f, level + 1, &format!("{continuation}{branch}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub entry_type: FileSystemEntryType,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    /// Octal permission bits on unix, `readonly`/`writable` elsewhere
    pub permissions: String,
}

#[derive(Debug, Clone, Default)]
pub enum SearchMode {
    #[default]
    Exact,
    Regex,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    pub case_sensitive: bool,
    pub whole_words: bool,
    pub mode: SearchMode,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ContentMatch {
    pub file: PathBuf,
    /// 1-based
    pub line_number: usize,
    pub line: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_timestamp_format() {
        let time = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 20, 30)
            .single()
            .expect("valid date")
            + chrono::Duration::milliseconds(123);
        assert_eq!(file_timestamp(time), "2024-05-01T10-20-30-123Z");
        assert_eq!(parse_file_timestamp("2024-05-01T10-20-30-123Z"), Some(time));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert_eq!(parse_file_timestamp("txt"), None);
        assert_eq!(parse_file_timestamp("2024-05-01T10:20:30.123Z"), None);
        assert_eq!(parse_file_timestamp("2024-13-01T10-20-30-123Z"), None);
    }

    #[test]
    fn test_trash_entry_from_name() {
        let entry = TrashEntry::from_name(
            "report.final.txt.2024-05-01T10-20-30-123Z".to_string(),
            PathBuf::from("/t/report.final.txt.2024-05-01T10-20-30-123Z"),
            false,
        );
        assert_eq!(entry.original_name, "report.final.txt");
        assert!(entry.trashed_at.is_some());

        let foreign = TrashEntry::from_name("stray.txt".to_string(), PathBuf::from("/t/x"), false);
        assert_eq!(foreign.original_name, "stray.txt");
        assert_eq!(foreign.trashed_at, None);
    }

    #[test]
    fn test_file_tree_rendering() {
        let file = |name: &str| FileTreeEntry {
            name: name.to_string(),
            entry_type: FileSystemEntryType::File,
            children: BTreeMap::new(),
            is_expanded: false,
        };
        let mut src = FileTreeEntry {
            name: "src".to_string(),
            entry_type: FileSystemEntryType::Directory,
            children: BTreeMap::new(),
            is_expanded: true,
        };
        src.children.insert("main.rs".to_string(), file("main.rs"));
        let deep = FileTreeEntry {
            name: "deep".to_string(),
            entry_type: FileSystemEntryType::Directory,
            children: BTreeMap::new(),
            is_expanded: false,
        };
        let mut root = FileTreeEntry {
            name: "project".to_string(),
            entry_type: FileSystemEntryType::Directory,
            children: BTreeMap::new(),
            is_expanded: true,
        };
        root.children.insert("README.md".to_string(), file("README.md"));
        root.children.insert("src".to_string(), src);
        root.children.insert("deep".to_string(), deep);

        let expected = "project/\n├─ deep/ [...]\n├─ src/\n│  └─ main.rs\n└─ README.md\n";
        assert_eq!(root.to_string(), expected);
    }
}
