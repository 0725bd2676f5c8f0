use super::MessageOutput;
use crate::tools::core::{Render, Tool, ToolContext, ToolResult, ToolSpec};
use anyhow::Result;
use fs_explorer::{EmptyTrashOutcome, TrashEntry};
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct MoveToTrashInput {
    pub path: String,
}

pub struct MoveToTrashTool;

#[async_trait::async_trait]
impl Tool for MoveToTrashTool {
    type Input = MoveToTrashInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "move_to_trash",
            description: concat!(
                "Move a file or directory into the trash instead of deleting it. ",
                "Use list_trash to see the name it was stored under."
            ),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                },
                "required": ["path"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let path = context.authorize(&input.path)?;
        let location = context.lifecycle.move_to_trash(&path).await?;
        Ok(MessageOutput::new(format!(
            "Moved {path} to trash as {}",
            location.display()
        )))
    }
}

#[derive(Deserialize)]
pub struct ListTrashInput {}

pub struct ListTrashOutput {
    pub entries: Vec<TrashEntry>,
}

impl Render for ListTrashOutput {
    fn status(&self) -> String {
        format!("{} item(s) in trash", self.entries.len())
    }

    fn render(&self) -> String {
        if self.entries.is_empty() {
            return "Trash is empty".to_string();
        }
        let mut formatted = String::new();
        for entry in &self.entries {
            let kind = if entry.is_directory { "[DIR]" } else { "[FILE]" };
            let trashed_at = entry
                .trashed_at
                .map(|time| format!(" (trashed {})", time.to_rfc3339()))
                .unwrap_or_default();
            formatted.push_str(&format!(
                "{kind} {} <- {}{trashed_at}\n",
                entry.name, entry.original_name
            ));
        }
        formatted
    }
}

impl ToolResult for ListTrashOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct ListTrashTool;

#[async_trait::async_trait]
impl Tool for ListTrashTool {
    type Input = ListTrashInput;
    type Output = ListTrashOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "list_trash",
            description: "List everything currently in the trash with the name needed to restore it.",
            parameters_schema: json!({ "type": "object", "properties": {} }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, _input: Self::Input) -> Result<Self::Output> {
        let mut entries: Vec<TrashEntry> = context.lifecycle.list_trash().try_collect().await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ListTrashOutput { entries })
    }
}

#[derive(Deserialize)]
pub struct RestoreFromTrashInput {
    /// Name of the entry inside the trash directory
    pub trash_name: String,
    pub target: String,
}

pub struct RestoreFromTrashTool;

#[async_trait::async_trait]
impl Tool for RestoreFromTrashTool {
    type Input = RestoreFromTrashInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "restore_from_trash",
            description: "Move an entry out of the trash to the given target path. The target must not exist.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "trash_name": {
                        "type": "string",
                        "description": "Entry name as shown by list_trash"
                    },
                    "target": {
                        "type": "string",
                        "description": "Where to put the restored file or directory"
                    }
                },
                "required": ["trash_name", "target"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let target = context.authorize(&input.target)?;
        let restored = context.lifecycle.restore(&input.trash_name, &target).await?;
        Ok(MessageOutput::new(format!(
            "Restored {} to {}",
            input.trash_name,
            restored.display()
        )))
    }
}

#[derive(Deserialize)]
pub struct EmptyTrashInput {
    #[serde(default)]
    pub confirm: bool,
}

pub struct EmptyTrashOutput {
    pub outcome: EmptyTrashOutcome,
}

impl Render for EmptyTrashOutput {
    fn status(&self) -> String {
        match &self.outcome {
            EmptyTrashOutcome::ConfirmationRequired { .. } => "Confirmation required".to_string(),
            EmptyTrashOutcome::Emptied { removed, failures } => {
                format!("Removed {removed} item(s), {} failed", failures.len())
            }
        }
    }

    fn render(&self) -> String {
        match &self.outcome {
            EmptyTrashOutcome::ConfirmationRequired { pending } => format!(
                "Emptying the trash permanently deletes {pending} item(s). Call again with confirm: true to proceed."
            ),
            EmptyTrashOutcome::Emptied { removed, failures } => {
                let mut formatted = format!("Permanently deleted {removed} item(s) from trash\n");
                for (path, error) in failures {
                    formatted.push_str(&format!(
                        "Failed to delete '{}': {}\n",
                        path.display(),
                        error
                    ));
                }
                formatted
            }
        }
    }
}

impl ToolResult for EmptyTrashOutput {
    fn is_success(&self) -> bool {
        match &self.outcome {
            EmptyTrashOutcome::ConfirmationRequired { .. } => true,
            EmptyTrashOutcome::Emptied { failures, .. } => failures.is_empty(),
        }
    }
}

pub struct EmptyTrashTool;

#[async_trait::async_trait]
impl Tool for EmptyTrashTool {
    type Input = EmptyTrashInput;
    type Output = EmptyTrashOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "empty_trash",
            description: "Permanently delete everything in the trash. Does nothing unless confirm is true.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "confirm": {
                        "type": "boolean",
                        "description": "Must be true to actually delete"
                    }
                }
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": true
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let outcome = context.lifecycle.empty_trash(input.confirm).await?;
        Ok(EmptyTrashOutput { outcome })
    }
}
