use super::dyn_tool::DynTool;
use super::spec::ToolSpec;
use std::collections::HashMap;
use std::sync::OnceLock;

/// All tools the server offers, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<ToolRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let mut registry = ToolRegistry::new();
            registry.register_default_tools();
            registry
        })
    }

    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Box<dyn DynTool>) {
        self.tools.insert(tool.spec().name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Specs of every registered tool, ordered by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by_key(|spec| spec.name);
        specs
    }

    fn register_default_tools(&mut self) {
        use crate::tools::impls::{
            ArchiveDirectoryTool, BackupFileTool, CopyFileTool, CreateDirectoryTool,
            DirectoryTreeTool, EmptyTrashTool, ExtractArchiveTool, GetFileInfoTool, GrepFilesTool,
            ListAllowedDirectoriesTool, ListDirectoryTool, ListTrashTool, MoveFileTool,
            MoveToTrashTool, ReadFileTool, ReadMultipleFilesTool, RestoreBackupTool,
            RestoreFromTrashTool, SearchFilesTool, WriteFileTool,
        };

        self.register(Box::new(ReadFileTool));
        self.register(Box::new(ReadMultipleFilesTool));
        self.register(Box::new(WriteFileTool));
        self.register(Box::new(CreateDirectoryTool));
        self.register(Box::new(ListDirectoryTool));
        self.register(Box::new(DirectoryTreeTool));
        self.register(Box::new(MoveFileTool));
        self.register(Box::new(CopyFileTool));
        self.register(Box::new(SearchFilesTool));
        self.register(Box::new(GrepFilesTool));
        self.register(Box::new(GetFileInfoTool));
        self.register(Box::new(ListAllowedDirectoriesTool));

        self.register(Box::new(MoveToTrashTool));
        self.register(Box::new(ListTrashTool));
        self.register(Box::new(RestoreFromTrashTool));
        self.register(Box::new(EmptyTrashTool));
        self.register(Box::new(BackupFileTool));
        self.register(Box::new(RestoreBackupTool));
        self.register(Box::new(ArchiveDirectoryTool));
        self.register(Box::new(ExtractArchiveTool));
    }
}
