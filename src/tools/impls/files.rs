use super::MessageOutput;
use crate::tools::core::{Render, Tool, ToolContext, ToolResult, ToolSpec};
use anyhow::Result;
use fs_explorer::{DirEntryInfo, FileInfo, FileTreeEntry};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

fn default_tree_depth() -> usize {
    3
}

#[derive(Deserialize)]
pub struct PathInput {
    pub path: String,
}

#[derive(Deserialize)]
pub struct SourceDestinationInput {
    pub source: String,
    pub destination: String,
}

fn path_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": description
            }
        },
        "required": ["path"]
    })
}

fn source_destination_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "source": { "type": "string" },
            "destination": { "type": "string" }
        },
        "required": ["source", "destination"]
    })
}

// read_file

pub struct ReadFileOutput {
    pub path: PathBuf,
    pub content: String,
}

impl Render for ReadFileOutput {
    fn status(&self) -> String {
        format!("Read {} ({} bytes)", self.path.display(), self.content.len())
    }

    fn render(&self) -> String {
        self.content.clone()
    }
}

impl ToolResult for ReadFileOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct ReadFileTool;

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    type Input = PathInput;
    type Output = ReadFileOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "read_file",
            description: "Read the complete contents of a text file. Only works within allowed directories.",
            parameters_schema: path_schema("Path of the file to read"),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        let content = context.explorer.read_file(&path).await?;
        Ok(ReadFileOutput {
            path: path.into_path_buf(),
            content,
        })
    }
}

// read_multiple_files

#[derive(Deserialize)]
pub struct ReadMultipleFilesInput {
    pub paths: Vec<String>,
}

pub struct ReadMultipleFilesOutput {
    /// Requested path and either its content or why it could not be read
    pub files: Vec<(String, std::result::Result<String, String>)>,
}

impl Render for ReadMultipleFilesOutput {
    fn status(&self) -> String {
        let failed = self.files.iter().filter(|(_, r)| r.is_err()).count();
        format!("Read {} file(s), {} failed", self.files.len() - failed, failed)
    }

    fn render(&self) -> String {
        self.files
            .iter()
            .map(|(path, result)| match result {
                Ok(content) => format!("{path}:\n{content}\n"),
                Err(error) => format!("{path}: Error - {error}"),
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

impl ToolResult for ReadMultipleFilesOutput {
    fn is_success(&self) -> bool {
        self.files.iter().any(|(_, result)| result.is_ok())
    }
}

pub struct ReadMultipleFilesTool;

#[async_trait::async_trait]
impl Tool for ReadMultipleFilesTool {
    type Input = ReadMultipleFilesInput;
    type Output = ReadMultipleFilesOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "read_multiple_files",
            description: "Read several files at once. Failed reads are reported per file and do not stop the others.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "paths": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["paths"]
            }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        // Authorization failures are per file, like read failures
        let mut files: Vec<(String, std::result::Result<String, String>)> = Vec::new();
        let mut authorized = Vec::new();
        let mut slots = Vec::new();
        for requested in input.paths {
            match context.authorize(&requested) {
                Ok(path) => {
                    slots.push(files.len());
                    authorized.push(path);
                    files.push((requested, Ok(String::new())));
                }
                Err(e) => files.push((requested, Err(e.to_string()))),
            }
        }

        let results = context.explorer.read_files(&authorized).await;
        for (slot, result) in slots.into_iter().zip(results) {
            files[slot].1 = result.map_err(|e| e.to_string());
        }

        Ok(ReadMultipleFilesOutput { files })
    }
}

// write_file

#[derive(Deserialize)]
pub struct WriteFileInput {
    pub path: String,
    pub content: String,
}

pub struct WriteFileTool;

#[async_trait::async_trait]
impl Tool for WriteFileTool {
    type Input = WriteFileInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "write_file",
            description: "Create a new file or completely overwrite an existing one. The parent directory must exist.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" }
                },
                "required": ["path", "content"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": true,
                "idempotentHint": true
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        context.explorer.write_file(&path, &input.content).await?;
        Ok(MessageOutput::new(format!("Successfully wrote to {path}")))
    }
}

// create_directory

pub struct CreateDirectoryTool;

#[async_trait::async_trait]
impl Tool for CreateDirectoryTool {
    type Input = PathInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "create_directory",
            description: "Create a directory. Succeeds silently if it already exists.",
            parameters_schema: path_schema("Directory to create"),
            annotations: Some(json!({
                "readOnlyHint": false,
                "idempotentHint": true
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        context.explorer.create_directory(&path).await?;
        Ok(MessageOutput::new(format!(
            "Successfully created directory {path}"
        )))
    }
}

// list_directory

pub struct ListDirectoryOutput {
    pub path: PathBuf,
    pub entries: Vec<DirEntryInfo>,
}

impl Render for ListDirectoryOutput {
    fn status(&self) -> String {
        format!("Listed {} entries in {}", self.entries.len(), self.path.display())
    }

    fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ToolResult for ListDirectoryOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct ListDirectoryTool;

#[async_trait::async_trait]
impl Tool for ListDirectoryTool {
    type Input = PathInput;
    type Output = ListDirectoryOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "list_directory",
            description: "List the immediate children of a directory, marked [DIR] or [FILE].",
            parameters_schema: path_schema("Directory to list"),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        let entries = context.explorer.list_directory(&path).await?;
        Ok(ListDirectoryOutput {
            path: path.into_path_buf(),
            entries,
        })
    }
}

// directory_tree

#[derive(Deserialize)]
pub struct DirectoryTreeInput {
    pub path: String,
    #[serde(default = "default_tree_depth")]
    pub max_depth: usize,
}

pub struct DirectoryTreeOutput {
    pub tree: FileTreeEntry,
}

impl Render for DirectoryTreeOutput {
    fn status(&self) -> String {
        format!("Built tree for {}", self.tree.name)
    }

    fn render(&self) -> String {
        self.tree.to_string()
    }
}

impl ToolResult for DirectoryTreeOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct DirectoryTreeTool;

#[async_trait::async_trait]
impl Tool for DirectoryTreeTool {
    type Input = DirectoryTreeInput;
    type Output = DirectoryTreeOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "directory_tree",
            description: "Show a directory as an indented tree. Directories deeper than max_depth are collapsed to [...].",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "max_depth": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "How many levels to expand (default 3)"
                    }
                },
                "required": ["path"]
            }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        let tree = context
            .explorer
            .directory_tree(&path, input.max_depth)
            .await?;
        Ok(DirectoryTreeOutput { tree })
    }
}

// move_file

pub struct MoveFileTool;

#[async_trait::async_trait]
impl Tool for MoveFileTool {
    type Input = SourceDestinationInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "move_file",
            description: "Move or rename a file or directory. Fails if the destination already exists.",
            parameters_schema: source_destination_schema(),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let source = context.authorize(&input.source)?;
        let destination = context.authorize(&input.destination)?;
        context.explorer.move_file(&source, &destination).await?;
        Ok(MessageOutput::new(format!(
            "Successfully moved {source} to {destination}"
        )))
    }
}

// copy_file

pub struct CopyFileTool;

#[async_trait::async_trait]
impl Tool for CopyFileTool {
    type Input = SourceDestinationInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "copy_file",
            description: "Copy a file, or a directory recursively. Fails if the destination already exists.",
            parameters_schema: source_destination_schema(),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let source = context.authorize(&input.source)?;
        let destination = context.authorize(&input.destination)?;
        let bytes = context.explorer.copy_file(&source, &destination).await?;
        Ok(MessageOutput::new(format!(
            "Successfully copied {source} to {destination} ({bytes} bytes)"
        )))
    }
}

// get_file_info

pub struct FileInfoOutput {
    pub info: FileInfo,
}

impl Render for FileInfoOutput {
    fn status(&self) -> String {
        format!("Got info for {}", self.info.path.display())
    }

    fn render(&self) -> String {
        let time = |t: &Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unavailable".to_string())
        };
        format!(
            "path: {}\ntype: {:?}\nsize: {}\ncreated: {}\nmodified: {}\naccessed: {}\npermissions: {}",
            self.info.path.display(),
            self.info.entry_type,
            self.info.size,
            time(&self.info.created),
            time(&self.info.modified),
            time(&self.info.accessed),
            self.info.permissions
        )
    }
}

impl ToolResult for FileInfoOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct GetFileInfoTool;

#[async_trait::async_trait]
impl Tool for GetFileInfoTool {
    type Input = PathInput;
    type Output = FileInfoOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_file_info",
            description: "Show size, type, timestamps and permissions of a file or directory.",
            parameters_schema: path_schema("File or directory to inspect"),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        let info = context.explorer.file_info(&path).await?;
        Ok(FileInfoOutput { info })
    }
}

// list_allowed_directories

#[derive(Deserialize)]
pub struct NoInput {}

pub struct AllowedDirectoriesOutput {
    pub roots: Vec<PathBuf>,
}

impl Render for AllowedDirectoriesOutput {
    fn status(&self) -> String {
        format!("{} allowed directories", self.roots.len())
    }

    fn render(&self) -> String {
        let mut formatted = String::from("Allowed directories:\n");
        for root in &self.roots {
            formatted.push_str(&format!("{}\n", root.display()));
        }
        formatted
    }
}

impl ToolResult for AllowedDirectoriesOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct ListAllowedDirectoriesTool;

#[async_trait::async_trait]
impl Tool for ListAllowedDirectoriesTool {
    type Input = NoInput;
    type Output = AllowedDirectoriesOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "list_allowed_directories",
            description: "List the directories this server is allowed to access.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, _input: Self::Input) -> Result<Self::Output> {
        Ok(AllowedDirectoriesOutput {
            roots: context.sandbox.roots().to_vec(),
        })
    }
}
