use crate::tools::core::{Render, Tool, ToolContext, ToolResult, ToolSpec};
use anyhow::Result;
use fs_explorer::{ArchiveReport, ExtractReport};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct ArchiveDirectoryInput {
    pub source_dir: String,
    pub archive_path: String,
}

pub struct ArchiveDirectoryOutput {
    pub report: ArchiveReport,
}

impl Render for ArchiveDirectoryOutput {
    fn status(&self) -> String {
        format!("Archived {} file(s)", self.report.files)
    }

    fn render(&self) -> String {
        let mut formatted = format!(
            "Created {} with {} file(s) and {} directory(ies)\n",
            self.report.archive.display(),
            self.report.files,
            self.report.directories
        );
        for skipped in &self.report.skipped {
            formatted.push_str(&format!("Skipped symbolic link {}\n", skipped.display()));
        }
        formatted
    }
}

impl ToolResult for ArchiveDirectoryOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct ArchiveDirectoryTool;

#[async_trait::async_trait]
impl Tool for ArchiveDirectoryTool {
    type Input = ArchiveDirectoryInput;
    type Output = ArchiveDirectoryOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "archive_directory",
            description: "Pack a directory into a new zip archive. Symbolic links are skipped.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "source_dir": { "type": "string" },
                    "archive_path": {
                        "type": "string",
                        "description": "Path of the .zip file to create; must not exist"
                    }
                },
                "required": ["source_dir", "archive_path"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let source = context.authorize(&input.source_dir)?;
        let archive = context.authorize(&input.archive_path)?;
        let report = context.lifecycle.archive_directory(&source, &archive).await?;
        Ok(ArchiveDirectoryOutput { report })
    }
}

#[derive(Deserialize)]
pub struct ExtractArchiveInput {
    pub archive_path: String,
    pub destination_dir: String,
}

pub struct ExtractArchiveOutput {
    pub report: ExtractReport,
}

impl Render for ExtractArchiveOutput {
    fn status(&self) -> String {
        format!(
            "Extracted {} file(s), rejected {}",
            self.report.extracted.len(),
            self.report.rejected.len()
        )
    }

    fn render(&self) -> String {
        let mut formatted = format!(
            "Extracted {} file(s) and {} directory(ies)\n",
            self.report.extracted.len(),
            self.report.directories
        );
        for (entry, reason) in &self.report.rejected {
            formatted.push_str(&format!("Rejected entry '{entry}': {reason}\n"));
        }
        formatted
    }
}

impl ToolResult for ExtractArchiveOutput {
    fn is_success(&self) -> bool {
        self.report.rejected.is_empty()
    }
}

pub struct ExtractArchiveTool;

#[async_trait::async_trait]
impl Tool for ExtractArchiveTool {
    type Input = ExtractArchiveInput;
    type Output = ExtractArchiveOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "extract_archive",
            description: concat!(
                "Unpack a zip archive into a directory. Entries that would land outside ",
                "the destination or the allowed directories are rejected and reported."
            ),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "archive_path": { "type": "string" },
                    "destination_dir": { "type": "string" }
                },
                "required": ["archive_path", "destination_dir"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let archive = context.authorize(&input.archive_path)?;
        let destination = context.authorize(&input.destination_dir)?;
        let report = context
            .lifecycle
            .extract_archive(&archive, &destination)
            .await?;
        Ok(ExtractArchiveOutput { report })
    }
}
