//! Tool registry for managing available tools

use std::sync::Arc;

use crate::tools::{Tool, ToolContext, ToolExecutor};

/// Names of the advertised tools, in order
pub const TOOL_NAMES: [&str; 6] = [
    "get_deadlines",
    "add_to_reminders",
    "list_courses",
    "download_course_files",
    "set_download_path",
    "get_download_path_info",
];

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: Vec<Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self, context: Arc<ToolContext>) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories.retain(|f| f.tool_name() != factory.tool_name());
        self.factories.push(factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str, context: Arc<ToolContext>) -> Option<Box<dyn Tool>> {
        self.factories
            .iter()
            .find(|f| f.tool_name() == name)
            .map(|factory| factory.create(context))
    }

    /// List all available tool names in registration order
    pub fn list_tools(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.tool_name()).collect()
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .iter()
            .find(|f| f.tool_name() == name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with all available tools
    pub fn create_executor_with_all(&self, context: Arc<ToolContext>) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for factory in &self.factories {
            executor.register_tool(factory.create(context.clone()));
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        use crate::tools::builtin::*;

        let mut registry = Self::new();

        registry.register_factory(Box::new(GetDeadlinesToolFactory));
        registry.register_factory(Box::new(AddToRemindersToolFactory));
        registry.register_factory(Box::new(ListCoursesToolFactory));
        registry.register_factory(Box::new(DownloadCourseFilesToolFactory));
        registry.register_factory(Box::new(SetDownloadPathToolFactory));
        registry.register_factory(Box::new(GetDownloadPathInfoToolFactory));

        registry
    }
}

/// Macro to help implement tool factories
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $tool:ident, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(
                &self,
                context: std::sync::Arc<$crate::tools::ToolContext>,
            ) -> Box<dyn $crate::tools::Tool> {
                Box::new($tool::new(context))
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}
