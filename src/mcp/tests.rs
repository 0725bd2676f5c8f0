use crate::mcp::handler::MessageHandler;
use crate::tools::tests::test_context;
use crate::utils::MockWriter;
use anyhow::Result;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

async fn setup_handler() -> Result<(TempDir, PathBuf, Arc<Mutex<Vec<String>>>, MessageHandler)> {
    let (temp_dir, root, context) = test_context().await?;
    let writer = MockWriter::new();
    let messages = writer.messages.clone();
    let handler = MessageHandler::new(context, Box::new(writer));
    Ok((temp_dir, root, messages, handler))
}

/// Sends one request and returns the single response it produced.
async fn request(
    handler: &mut MessageHandler,
    messages: &Arc<Mutex<Vec<String>>>,
    request: Value,
) -> Result<Value> {
    handler.handle_message(&request.to_string()).await?;
    let mut sent = messages.lock().await;
    assert_eq!(sent.len(), 1, "expected exactly one response");
    let response = sent.remove(0);
    Ok(serde_json::from_str(&response)?)
}

fn call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

#[tokio::test]
async fn test_initialize() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        json!({
            "jsonrpc": "2.0",
            "id": "init",
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "clientInfo": { "name": "test-client", "version": "1.0" }
            }
        }),
    )
    .await?;

    assert_eq!(response["id"], "init");
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "sandboxed-fs");
    assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
    Ok(())
}

#[tokio::test]
async fn test_initialized_notification_has_no_response() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;
    handler
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await?;
    handler.handle_message("not json at all").await?;
    assert!(messages.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tools_list() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
    )
    .await?;

    let tools = response["result"]["tools"].as_array().cloned().unwrap_or_default();
    assert_eq!(tools.len(), 20);
    let trash = tools
        .iter()
        .find(|tool| tool["name"] == "move_to_trash")
        .expect("move_to_trash advertised");
    assert_eq!(trash["inputSchema"]["required"], json!(["path"]));
    assert_eq!(trash["annotations"]["destructiveHint"], false);
    Ok(())
}

#[tokio::test]
async fn test_tool_call_success() -> Result<()> {
    let (_temp, root, messages, mut handler) = setup_handler().await?;
    std::fs::write(root.join("hello.txt"), "Hello, sandbox")?;

    let response = request(
        &mut handler,
        &messages,
        call(2, "read_file", json!({ "path": "hello.txt" })),
    )
    .await?;

    assert_eq!(response["id"], 2);
    assert_eq!(response["result"]["isError"], false);
    assert_eq!(response["result"]["content"][0]["type"], "text");
    assert_eq!(response["result"]["content"][0]["text"], "Hello, sandbox");
    Ok(())
}

#[tokio::test]
async fn test_access_denied_is_a_failed_tool_result() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        call(3, "read_file", json!({ "path": "../../../../etc/passwd" })),
    )
    .await?;

    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_default();
    assert!(
        text.starts_with("Access denied - path outside allowed directories"),
        "{text}"
    );
    Ok(())
}

#[tokio::test]
async fn test_tool_without_arguments() -> Result<()> {
    let (_temp, root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "list_allowed_directories" }
        }),
    )
    .await?;

    assert_eq!(response["result"]["isError"], false);
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_default();
    assert!(text.contains(&root.display().to_string()));
    Ok(())
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(&mut handler, &messages, call(5, "format_disk", json!({}))).await?;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["message"], "Unknown tool: format_disk");
    Ok(())
}

#[tokio::test]
async fn test_bad_arguments_are_invalid_params() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        call(6, "write_file", json!({ "path": 42 })),
    )
    .await?;

    assert_eq!(response["error"]["code"], -32602);
    Ok(())
}

#[tokio::test]
async fn test_unknown_method() -> Result<()> {
    let (_temp, _root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        json!({ "jsonrpc": "2.0", "id": 7, "method": "sampling/createMessage" }),
    )
    .await?;

    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(
        response["error"]["message"],
        "Method not found: sampling/createMessage"
    );
    Ok(())
}

#[tokio::test]
async fn test_resources_list_roots() -> Result<()> {
    let (_temp, root, messages, mut handler) = setup_handler().await?;

    let response = request(
        &mut handler,
        &messages,
        json!({ "jsonrpc": "2.0", "id": 8, "method": "resources/list" }),
    )
    .await?;

    assert_eq!(
        response["result"]["resources"][0]["uri"],
        format!("file://{}", root.display())
    );

    messages.lock().await.clear();
    let response = request(
        &mut handler,
        &messages,
        json!({ "jsonrpc": "2.0", "id": 9, "method": "prompts/list" }),
    )
    .await?;
    assert_eq!(response["result"]["prompts"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_trash_round_trip_over_json_rpc() -> Result<()> {
    let (_temp, root, messages, mut handler) = setup_handler().await?;
    std::fs::write(root.join("draft.md"), "# draft")?;

    let response = request(
        &mut handler,
        &messages,
        call(10, "move_to_trash", json!({ "path": "draft.md" })),
    )
    .await?;
    assert_eq!(response["result"]["isError"], false);
    assert!(!root.join("draft.md").exists());

    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let trash_name = PathBuf::from(text.rsplit_once(" to trash as ").map(|(_, p)| p).unwrap_or(""))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .expect("trash entry name");

    let response = request(
        &mut handler,
        &messages,
        call(
            11,
            "restore_from_trash",
            json!({ "trash_name": trash_name, "target": "draft.md" }),
        ),
    )
    .await?;
    assert_eq!(response["result"]["isError"], false);
    assert_eq!(std::fs::read_to_string(root.join("draft.md"))?, "# draft");
    Ok(())
}
