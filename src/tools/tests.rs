use crate::tools::core::{ToolContext, ToolError, ToolRegistry};
use anyhow::Result;
use sandbox::{CaseSensitivity, PathSandbox, SandboxConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A context over a single fresh temporary root.
pub async fn test_context() -> Result<(TempDir, PathBuf, ToolContext)> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().canonicalize()?;
    let config = SandboxConfig::new([&root])?
        .with_case_sensitivity(CaseSensitivity::Sensitive)
        .with_working_dir(&root);
    let context = ToolContext::new(Arc::new(PathSandbox::new(config))).await?;
    Ok((temp_dir, root, context))
}

/// Runs a registered tool and returns its rendered text and success flag.
pub async fn call_tool(context: &ToolContext, name: &str, arguments: Value) -> Result<(String, bool)> {
    let tool = ToolRegistry::global()
        .get(name)
        .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
    let output = tool.invoke(context, arguments).await?;
    Ok((output.as_render().render(), output.is_success()))
}

#[test]
fn test_registry_contains_every_tool() {
    let names: Vec<&str> = ToolRegistry::global()
        .specs()
        .iter()
        .map(|spec| spec.name)
        .collect();

    assert_eq!(
        names,
        vec![
            "archive_directory",
            "backup_file",
            "copy_file",
            "create_directory",
            "directory_tree",
            "empty_trash",
            "extract_archive",
            "get_file_info",
            "grep_files",
            "list_allowed_directories",
            "list_directory",
            "list_trash",
            "move_file",
            "move_to_trash",
            "read_file",
            "read_multiple_files",
            "restore_backup",
            "restore_from_trash",
            "search_files",
            "write_file",
        ]
    );
}

#[test]
fn test_schemas_are_objects() {
    for spec in ToolRegistry::global().specs() {
        assert_eq!(spec.parameters_schema["type"], "object", "{}", spec.name);
        assert!(!spec.description.is_empty(), "{}", spec.name);
    }
}

#[tokio::test]
async fn test_invalid_arguments_are_parse_errors() -> Result<()> {
    let (_temp, _root, context) = test_context().await?;

    let err = call_tool(&context, "read_file", json!({ "wrong": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::ParseError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_access_denied_is_reported_verbatim() -> Result<()> {
    let (_temp, _root, context) = test_context().await?;
    let outside = TempDir::new()?;
    let target = outside.path().canonicalize()?.join("secret.txt");
    std::fs::write(&target, "secret")?;

    let err = call_tool(
        &context,
        "read_file",
        json!({ "path": target.to_string_lossy() }),
    )
    .await
    .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Access denied - path outside allowed directories"));
    Ok(())
}
