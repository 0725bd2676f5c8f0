use super::render::Render;
use super::result::ToolResult;
use super::spec::ToolSpec;
use anyhow::Result;
use fs_explorer::{Explorer, LifecycleManager};
use sandbox::{AuthorizedPath, PathSandbox, SandboxError};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Everything a tool may use. Shared read-only across requests.
pub struct ToolContext {
    pub sandbox: Arc<PathSandbox>,
    pub explorer: Explorer,
    pub lifecycle: LifecycleManager,
}

impl ToolContext {
    /// Builds the components on top of `sandbox` and creates the trash
    /// directory.
    pub async fn new(sandbox: Arc<PathSandbox>) -> fs_explorer::Result<Self> {
        let lifecycle = LifecycleManager::new(sandbox.clone()).await?;
        Ok(Self {
            explorer: Explorer::new(sandbox.clone()),
            lifecycle,
            sandbox,
        })
    }

    /// Every path argument goes through here before it reaches a component.
    pub fn authorize(&self, path: &str) -> std::result::Result<AuthorizedPath, SandboxError> {
        self.sandbox.authorize(path)
    }
}

/// A named operation with typed input and renderable output.
#[async_trait::async_trait]
pub trait Tool: Send + Sync + 'static {
    type Input: DeserializeOwned + Send;

    type Output: Render + ToolResult + Send + Sync;

    fn spec(&self) -> ToolSpec;

    /// Runs the tool. An `Err` is an operation failure and is reported to
    /// the caller as a failed tool result.
    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output>;
}
