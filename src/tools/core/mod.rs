pub mod dyn_tool;
pub mod error;
pub mod registry;
pub mod render;
pub mod result;
pub mod spec;
pub mod tool;

pub use dyn_tool::{AnyOutput, DynTool};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use render::Render;
pub use result::ToolResult;
pub use spec::ToolSpec;
pub use tool::{Tool, ToolContext};
