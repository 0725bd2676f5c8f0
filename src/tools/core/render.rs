/// Formats tool outputs as text for the caller.
pub trait Render: Send + Sync + 'static {
    /// Short one-line summary, used for logging
    fn status(&self) -> String;

    /// Full text returned as the tool result
    fn render(&self) -> String;
}
