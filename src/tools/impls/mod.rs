mod archive;
mod backup;
mod files;
mod search;
mod trash;

pub use archive::{ArchiveDirectoryTool, ExtractArchiveTool};
pub use backup::{BackupFileTool, RestoreBackupTool};
pub use files::{
    CopyFileTool, CreateDirectoryTool, DirectoryTreeTool, GetFileInfoTool,
    ListAllowedDirectoriesTool, ListDirectoryTool, MoveFileTool, ReadFileTool,
    ReadMultipleFilesTool, WriteFileTool,
};
pub use search::{GrepFilesTool, SearchFilesTool};
pub use trash::{EmptyTrashTool, ListTrashTool, MoveToTrashTool, RestoreFromTrashTool};

use crate::tools::core::{Render, ToolResult};

/// Output of tools whose whole result is a confirmation sentence.
pub struct MessageOutput {
    pub message: String,
}

impl MessageOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Render for MessageOutput {
    fn status(&self) -> String {
        self.message.clone()
    }

    fn render(&self) -> String {
        self.message.clone()
    }
}

impl ToolResult for MessageOutput {
    fn is_success(&self) -> bool {
        true
    }
}
