use super::MessageOutput;
use crate::tools::core::{Tool, ToolContext, ToolSpec};
use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct BackupFileInput {
    pub path: String,
    /// Directory that receives the backup copy
    pub backup_dir: String,
}

pub struct BackupFileTool;

#[async_trait::async_trait]
impl Tool for BackupFileTool {
    type Input = BackupFileInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "backup_file",
            description: concat!(
                "Copy a file or directory into backup_dir as <name>.<timestamp>.backup. ",
                "The original is left untouched and existing backups are never overwritten."
            ),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "backup_dir": { "type": "string" }
                },
                "required": ["path", "backup_dir"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": false
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let source = context.authorize(&input.path)?;
        let backup_dir = context.authorize(&input.backup_dir)?;
        let backup = context.lifecycle.backup(&source, &backup_dir).await?;
        Ok(MessageOutput::new(format!(
            "Backed up {source} to {}",
            backup.display()
        )))
    }
}

#[derive(Deserialize)]
pub struct RestoreBackupInput {
    pub backup_path: String,
    pub destination: String,
}

pub struct RestoreBackupTool;

#[async_trait::async_trait]
impl Tool for RestoreBackupTool {
    type Input = RestoreBackupInput;
    type Output = MessageOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "restore_backup",
            description: "Copy a backup to the destination, overwriting whatever is there. The backup itself is kept.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "backup_path": {
                        "type": "string",
                        "description": "Exact path of the .backup file or directory"
                    },
                    "destination": { "type": "string" }
                },
                "required": ["backup_path", "destination"]
            }),
            annotations: Some(json!({
                "readOnlyHint": false,
                "destructiveHint": true,
                "idempotentHint": true
            })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let backup = context.authorize(&input.backup_path)?;
        let destination = context.authorize(&input.destination)?;
        context
            .lifecycle
            .restore_from_backup(&backup, &destination)
            .await?;
        Ok(MessageOutput::new(format!(
            "Restored {destination} from {backup}"
        )))
    }
}
