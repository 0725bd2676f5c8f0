use crate::tools::core::{Render, Tool, ToolContext, ToolResult, ToolSpec};
use anyhow::Result;
use fs_explorer::{ContentMatch, SearchMode, SearchOptions};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Deserialize)]
pub struct SearchFilesInput {
    pub path: String,
    pub pattern: String,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

pub struct SearchFilesOutput {
    pub pattern: String,
    pub matches: Vec<PathBuf>,
}

impl Render for SearchFilesOutput {
    fn status(&self) -> String {
        format!("Found {} match(es) for '{}'", self.matches.len(), self.pattern)
    }

    fn render(&self) -> String {
        if self.matches.is_empty() {
            return "No matches found".to_string();
        }
        self.matches
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ToolResult for SearchFilesOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct SearchFilesTool;

#[async_trait::async_trait]
impl Tool for SearchFilesTool {
    type Input = SearchFilesInput;
    type Output = SearchFilesOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_files",
            description: concat!(
                "Recursively find files and directories whose name contains the pattern ",
                "(case-insensitive). Symbolic links are not followed."
            ),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Directory to start from"
                    },
                    "pattern": { "type": "string" },
                    "exclude_patterns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Glob patterns to skip, e.g. 'target' or '*.log'"
                    }
                },
                "required": ["path", "pattern"]
            }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let root = context.authorize(&input.path)?;
        let matches = context
            .explorer
            .search_files(&root, &input.pattern, &input.exclude_patterns)
            .await?;
        Ok(SearchFilesOutput {
            pattern: input.pattern,
            matches,
        })
    }
}

#[derive(Deserialize)]
pub struct GrepFilesInput {
    pub path: String,
    pub query: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub whole_words: bool,
    /// Treat `query` as a regular expression
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub max_results: Option<usize>,
}

pub struct GrepFilesOutput {
    pub query: String,
    pub matches: Vec<ContentMatch>,
}

impl Render for GrepFilesOutput {
    fn status(&self) -> String {
        format!("Found {} line(s) matching '{}'", self.matches.len(), self.query)
    }

    fn render(&self) -> String {
        if self.matches.is_empty() {
            return "No matches found".to_string();
        }
        let mut formatted = String::new();
        for m in &self.matches {
            formatted.push_str(&format!(
                "{}:{}: {}\n",
                m.file.display(),
                m.line_number,
                m.line.trim_end()
            ));
        }
        formatted
    }
}

impl ToolResult for GrepFilesOutput {
    fn is_success(&self) -> bool {
        true
    }
}

pub struct GrepFilesTool;

#[async_trait::async_trait]
impl Tool for GrepFilesTool {
    type Input = GrepFilesInput;
    type Output = GrepFilesOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "grep_files",
            description: "Search file contents below a directory (or in a single file). Binary files are skipped.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "query": { "type": "string" },
                    "case_sensitive": { "type": "boolean" },
                    "whole_words": { "type": "boolean" },
                    "regex": { "type": "boolean" },
                    "max_results": { "type": "integer", "minimum": 1 }
                },
                "required": ["path", "query"]
            }),
            annotations: Some(json!({ "readOnlyHint": true })),
        }
    }

    async fn execute(&self, context: &ToolContext, input: Self::Input) -> Result<Self::Output> {
        let root = context.authorize(&input.path)?;
        let options = SearchOptions {
            query: input.query.clone(),
            case_sensitive: input.case_sensitive,
            whole_words: input.whole_words,
            mode: if input.regex {
                SearchMode::Regex
            } else {
                SearchMode::Exact
            },
            max_results: input.max_results,
        };
        let matches = context.explorer.grep_files(&root, options).await?;
        Ok(GrepFilesOutput {
            query: input.query,
            matches,
        })
    }
}
