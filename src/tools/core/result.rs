/// Whether a tool run counts as successful for `isError` reporting.
pub trait ToolResult: Send + Sync + 'static {
    fn is_success(&self) -> bool;
}
