use std::collections::HashMap;
use std::sync::Arc;

use super::tool::{Tool, ToolParameters, ToolResult};
use super::tool_context::ToolContext;

/// Registry for managing and discovering tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    categories: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("categories", &self.categories)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Register a tool with categories
    pub fn register_with_categories<T: Tool + 'static>(&mut self, tool: T, categories: Vec<String>) {
        let name = tool.name().to_string();
        self.register(tool);

        for category in categories {
            let names = self.categories.entry(category).or_default();
            if !names.contains(&name) {
                names.push(name.clone());
            }
        }
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get tools by category
    pub fn get_tools_by_category(&self, category: &str) -> Vec<Arc<dyn Tool>> {
        match self.categories.get(category) {
            Some(tool_names) => tool_names
                .iter()
                .filter_map(|name| self.tools.get(name))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order
    pub fn get_tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a tool by name
    pub async fn execute_tool(
        &self,
        name: &str,
        params: ToolParameters,
        context: &ToolContext,
    ) -> ToolResult {
        match self.get_tool(name) {
            Some(tool) => tool.execute(params, context).await,
            None => ToolResult::error(format!("Tool '{}' not found", name)),
        }
    }

    /// Get all tool definitions in OpenAI format, ordered by tool name
    pub fn get_openai_tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<_> = self.tools.iter().collect();
        tools.sort_by_key(|(name, _)| name.as_str());
        tools
            .into_iter()
            .map(|(_, tool)| tool.to_openai_definition())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ParameterDefinition;

    struct MockTool {
        name: String,
    }

    #[async_trait::async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "A test tool"
        }

        fn parameters(&self) -> HashMap<String, ParameterDefinition> {
            HashMap::new()
        }

        async fn execute(&self, _params: ToolParameters, _context: &ToolContext) -> ToolResult {
            ToolResult::success("mock result".to_string())
        }
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(MockTool {
            name: "test_tool".to_string(),
        });

        assert!(registry.has_tool("test_tool"));
        assert!(registry.get_tool("test_tool").is_some());

        let context = ToolContext::new(
            std::path::PathBuf::from("/tmp"),
            "test_session".to_string(),
        );
        let result = registry
            .execute_tool("test_tool", ToolParameters::new(), &context)
            .await;
        assert!(result.success);
        assert_eq!(result.content, "mock result");
    }

    #[test]
    fn test_category_lists_do_not_repeat() {
        let mut registry = ToolRegistry::new();
        let shell = vec!["shell".to_string()];
        registry.register_with_categories(MockTool { name: "bash".into() }, shell.clone());
        registry.register_with_categories(MockTool { name: "bash".into() }, shell);

        assert_eq!(registry.get_tools_by_category("shell").len(), 1);
        assert_eq!(registry.get_tool_names(), vec!["bash".to_string()]);
    }
}
