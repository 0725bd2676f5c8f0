use super::types::*;
use crate::tools::core::{ToolContext, ToolError, ToolRegistry};
use crate::utils::MessageWriter;
use anyhow::Result;
use tracing::{debug, error, trace, warn};

pub struct MessageHandler {
    context: ToolContext,
    registry: &'static ToolRegistry,
    message_writer: Box<dyn MessageWriter>,
}

impl MessageHandler {
    pub fn new(context: ToolContext, message_writer: Box<dyn MessageWriter>) -> Self {
        Self {
            context,
            registry: ToolRegistry::global(),
            message_writer,
        }
    }

    /// Sends a JSON-RPC response
    async fn send_response<T: serde::Serialize>(&mut self, id: RequestId, result: T) -> Result<()> {
        let response = JSONRPCResponse {
            jsonrpc: "2.0",
            id,
            result,
        };
        self.send_message(&serde_json::to_value(response)?).await
    }

    /// Sends a JSON-RPC error response
    async fn send_error(&mut self, id: RequestId, code: i32, message: String) -> Result<()> {
        let error = JSONRPCError {
            jsonrpc: "2.0",
            id,
            error: ErrorObject { code, message },
        };
        self.send_message(&serde_json::to_value(error)?).await
    }

    async fn send_message(&mut self, message: &serde_json::Value) -> Result<()> {
        let message_str = serde_json::to_string(message)?;

        // File contents can be large
        if !message_str.contains("\"result\":{\"content\":") {
            debug!("Sending message: {}", message_str);
        }

        self.message_writer.write_message(&message_str).await
    }

    async fn handle_initialize(&mut self, id: RequestId, params: InitializeParams) -> Result<()> {
        match &params.client_info {
            Some(client) => debug!("Initialize from {} {}", client.name, client.version),
            None => debug!("Initialize from unnamed client"),
        }

        self.send_response(
            id,
            InitializeResult {
                protocol_version: params.protocol_version,
                capabilities: ServerCapabilities {
                    tools: ListChangedCapability { list_changed: false },
                    resources: ListChangedCapability { list_changed: false },
                    prompts: ListChangedCapability { list_changed: false },
                },
                server_info: Implementation {
                    name: "sandboxed-fs".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(
                    "File system access restricted to the allowed directories. Deleted files go to a trash directory and can be restored."
                        .to_string(),
                ),
            },
        )
        .await
    }

    /// The allowed directories, one `file://` resource each
    async fn handle_resources_list(&mut self, id: RequestId) -> Result<()> {
        trace!("Handling resources/list request");
        let resources = self
            .context
            .sandbox
            .roots()
            .iter()
            .map(|root| Resource {
                uri: format!("file://{}", root.display()),
                name: root.display().to_string(),
                mime_type: None,
            })
            .collect();

        self.send_response(
            id,
            ListResourcesResult {
                resources,
                next_cursor: None,
            },
        )
        .await
    }

    async fn handle_tools_list(&mut self, id: RequestId) -> Result<()> {
        debug!("Handling tools/list request");
        let tools = self
            .registry
            .specs()
            .into_iter()
            .map(|spec| ToolDefinition {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                input_schema: spec.parameters_schema,
                annotations: spec.annotations,
            })
            .collect();

        self.send_response(
            id,
            ListToolsResult {
                tools,
                next_cursor: None,
            },
        )
        .await
    }

    async fn handle_tool_call(&mut self, id: RequestId, params: ToolCallParams) -> Result<()> {
        let ToolCallParams { name, arguments } = params;
        debug!("Handling tool call for {}", name);

        let result = async {
            let tool = self
                .registry
                .get(&name)
                .ok_or_else(|| ToolError::UnknownTool(name.clone()))?;
            // Tools without parameters may be called without arguments
            let arguments =
                arguments.unwrap_or_else(|| serde_json::Value::Object(Default::default()));

            let output = tool.invoke(&self.context, arguments).await?;
            debug!("{}: {}", name, output.as_render().status());
            Ok::<_, anyhow::Error>((output.as_render().render(), output.is_success()))
        }
        .await;

        match result {
            Ok((text, is_success)) => {
                self.send_response(
                    id,
                    ToolCallResult {
                        content: vec![ToolResultContent::Text { text }],
                        is_error: !is_success,
                    },
                )
                .await
            }
            Err(e) if e.downcast_ref::<ToolError>().is_some() => {
                self.send_error(id, -32602, e.to_string()).await
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                self.send_response(
                    id,
                    ToolCallResult {
                        content: vec![ToolResultContent::Text {
                            text: e.to_string(),
                        }],
                        is_error: true,
                    },
                )
                .await
            }
        }
    }

    async fn handle_prompts_list(&mut self, id: RequestId) -> Result<()> {
        trace!("Handling prompts/list request");
        self.send_response(
            id,
            ListPromptsResult {
                prompts: vec![],
                next_cursor: None,
            },
        )
        .await
    }

    /// Main message handling entry point
    pub async fn handle_message(&mut self, message: &str) -> Result<()> {
        let message: JSONRPCMessage = match serde_json::from_str(message) {
            Ok(msg) => msg,
            Err(e) => {
                error!("Invalid JSON-RPC message: {}", e);
                return Ok(());
            }
        };

        match message {
            JSONRPCMessage::Request {
                method, id, params, ..
            } => {
                trace!("Processing request: method={}, id={:?}", method, id);
                match method.as_str() {
                    "initialize" => {
                        match serde_json::from_value::<InitializeParams>(
                            params.unwrap_or_default(),
                        ) {
                            Ok(params) => self.handle_initialize(id, params).await?,
                            Err(e) => {
                                self.send_error(id, -32602, format!("Invalid initialize parameters: {e}"))
                                    .await?
                            }
                        }
                    }
                    "resources/list" => self.handle_resources_list(id).await?,
                    "tools/list" => self.handle_tools_list(id).await?,
                    "tools/call" => {
                        match serde_json::from_value::<ToolCallParams>(params.unwrap_or_default()) {
                            Ok(params) => self.handle_tool_call(id, params).await?,
                            Err(e) => {
                                self.send_error(id, -32602, format!("Invalid tool parameters: {e}"))
                                    .await?
                            }
                        }
                    }
                    "prompts/list" => self.handle_prompts_list(id).await?,
                    method => {
                        self.send_error(id, -32601, format!("Method not found: {method}"))
                            .await?
                    }
                }
            }

            JSONRPCMessage::Notification { method, params, .. } => match method.as_str() {
                "notifications/initialized" => {
                    if let Some(params) = params {
                        debug!("Client initialized with params: {:?}", params);
                    } else {
                        debug!("Client initialized");
                    }
                }
                _ => {
                    debug!("Unknown notification: {}", method);
                }
            },
        }

        Ok(())
    }
}
