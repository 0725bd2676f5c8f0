use thiserror::Error;

/// Problems with the call itself rather than with the operation it asked
/// for. These become JSON-RPC errors instead of failed tool results.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Failed to parse tool parameters: {0}")]
    ParseError(String),
}
