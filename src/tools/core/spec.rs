/// Static description of a tool as advertised by `tools/list`.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the tool's arguments
    pub parameters_schema: serde_json::Value,
    /// MCP hints such as `readOnlyHint` or `destructiveHint`
    pub annotations: Option<serde_json::Value>,
}
