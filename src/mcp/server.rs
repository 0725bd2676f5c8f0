use super::handler::MessageHandler;
use crate::tools::core::ToolContext;
use crate::utils::StdoutWriter;
use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{debug, error, trace};

pub struct MCPServer {
    handler: MessageHandler,
}

impl MCPServer {
    pub fn new(context: ToolContext) -> Self {
        Self {
            handler: MessageHandler::new(
                context,
                Box::new(StdoutWriter::new(tokio::io::stdout())),
            ),
        }
    }

    /// Serves newline-delimited JSON-RPC on stdin until EOF.
    pub async fn run(&mut self) -> Result<()> {
        debug!("Starting MCP server using stdio transport");

        let mut reader = BufReader::new(stdin());
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("Received message: {}", trimmed);

            if let Err(e) = self.handler.handle_message(trimmed).await {
                error!("Error handling message: {}", e);
            }
        }

        debug!("MCP server shutting down");
        Ok(())
    }
}
