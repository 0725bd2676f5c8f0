use super::error::ToolError;
use super::render::Render;
use super::result::ToolResult;
use super::spec::ToolSpec;
use super::tool::{Tool, ToolContext};
use anyhow::Result;
use serde_json::Value;

/// Type-erased tool output.
pub trait AnyOutput: Send + Sync {
    fn as_render(&self) -> &dyn Render;

    fn is_success(&self) -> bool;
}

impl<T: Render + ToolResult> AnyOutput for T {
    fn as_render(&self) -> &dyn Render {
        self
    }

    fn is_success(&self) -> bool {
        ToolResult::is_success(self)
    }
}

/// Object-safe view of [`Tool`] so tools with different input and output
/// types can live in one registry.
#[async_trait::async_trait]
pub trait DynTool: Send + Sync + 'static {
    fn spec(&self) -> ToolSpec;

    /// Parses `params` into the tool's input and runs it.
    async fn invoke(&self, context: &ToolContext, params: Value) -> Result<Box<dyn AnyOutput>>;
}

#[async_trait::async_trait]
impl<T: Tool> DynTool for T {
    fn spec(&self) -> ToolSpec {
        Tool::spec(self)
    }

    async fn invoke(&self, context: &ToolContext, params: Value) -> Result<Box<dyn AnyOutput>> {
        let input: T::Input = serde_json::from_value(params)
            .map_err(|e| ToolError::ParseError(e.to_string()))?;

        let output = self.execute(context, input).await?;
        Ok(Box::new(output) as Box<dyn AnyOutput>)
    }
}
