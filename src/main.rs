mod cli;
mod config;
mod logging;
mod mcp;
mod tools;
mod utils;

use crate::cli::Args;
use crate::config::Settings;
use crate::mcp::MCPServer;
use crate::tools::core::ToolContext;
use anyhow::{Context, Result};
use sandbox::{PathSandbox, SandboxConfig};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(args.verbose);

    let settings = Settings::resolve(&args)?;
    let sandbox_config = SandboxConfig::new(&settings.allowed_directories)
        .context("Refusing to start with an invalid allowed directory")?
        .with_case_sensitivity(settings.case_sensitivity);
    let sandbox = Arc::new(PathSandbox::new(sandbox_config));

    for root in sandbox.roots() {
        info!("Allowed directory: {}", root.display());
    }

    let context = ToolContext::new(sandbox)
        .await
        .context("Failed to prepare the trash directory")?;

    let mut server = MCPServer::new(context);
    server.run().await
}
