use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use shellkeep_toolcore::{
    param, ParameterDefinition, Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult,
};
use tempfile::TempDir;

// Configurable tool for exercising the registry
#[derive(Debug, Clone)]
struct TestTool {
    name: String,
    description: String,
    parameters: HashMap<String, ParameterDefinition>,
    should_fail: bool,
}

impl TestTool {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: HashMap::new(),
            should_fail: false,
        }
    }

    fn with_parameters(mut self, parameters: HashMap<String, ParameterDefinition>) -> Self {
        self.parameters = parameters;
        self
    }

    fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait::async_trait]
impl Tool for TestTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        self.parameters.clone()
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        if self.should_fail {
            ToolResult::error("Test tool failed intentionally".to_string())
        } else {
            ToolResult::success(format!(
                "Executed {} with {} parameters in {}",
                self.name,
                params.data.len(),
                context.session_id
            ))
        }
    }
}

fn create_test_context(temp_dir: &TempDir) -> ToolContext {
    ToolContext::new(temp_dir.path().to_path_buf(), "test_session".to_string())
}

#[tokio::test]
async fn test_registry_initialization() {
    let registry = ToolRegistry::new();
    assert!(registry.get_tool_names().is_empty());
    assert!(registry.get_openai_tool_definitions().is_empty());
    assert!(!registry.has_tool("any_tool"));
}

#[tokio::test]
async fn test_duplicate_tool_registration() {
    let mut registry = ToolRegistry::new();

    registry.register(TestTool::new("duplicate_tool", "First instance"));
    registry.register(TestTool::new("duplicate_tool", "Second instance"));

    assert_eq!(registry.get_tool_names().len(), 1);
    let retrieved_tool = registry.get_tool("duplicate_tool").unwrap();
    assert_eq!(retrieved_tool.description(), "Second instance");
}

#[tokio::test]
async fn test_tool_execution_success() {
    let temp_dir = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(TestTool::new("exec_tool", "Tool for execution testing"));

    let params = ToolParameters::new().set("param1", "value1").set("param2", 42);
    let result = registry
        .execute_tool("exec_tool", params, &create_test_context(&temp_dir))
        .await;

    assert!(result.success);
    assert_eq!(
        result.content,
        "Executed exec_tool with 2 parameters in test_session"
    );
}

#[tokio::test]
async fn test_tool_execution_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(TestTool::new("failing_tool", "A tool that always fails").failing());

    let result = registry
        .execute_tool("failing_tool", ToolParameters::new(), &create_test_context(&temp_dir))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Test tool failed intentionally"));
}

#[tokio::test]
async fn test_tool_execution_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ToolRegistry::new();

    let result = registry
        .execute_tool("nonexistent_tool", ToolParameters::new(), &create_test_context(&temp_dir))
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Tool 'nonexistent_tool' not found")
    );
}

#[tokio::test]
async fn test_get_tools_by_category() {
    let mut registry = ToolRegistry::new();

    registry.register_with_categories(TestTool::new("tool1", "First tool"), vec!["cat1".to_string()]);
    registry.register_with_categories(
        TestTool::new("tool2", "Second tool"),
        vec!["cat1".to_string(), "cat2".to_string()],
    );
    registry.register_with_categories(TestTool::new("tool3", "Third tool"), vec!["cat2".to_string()]);

    assert_eq!(registry.get_tools_by_category("cat1").len(), 2);
    assert_eq!(registry.get_tools_by_category("cat2").len(), 2);
    assert!(registry.get_tools_by_category("cat3").is_empty());
}

#[tokio::test]
async fn test_openai_tool_definitions_are_sorted() {
    let mut registry = ToolRegistry::new();

    let parameters = HashMap::from([
        param!("command", "string", "Command to run", required),
        param!("reset_cwd", "boolean", "Start fresh", optional, false),
    ]);
    registry.register(TestTool::new("zeta", "Last").with_parameters(parameters));
    registry.register(TestTool::new("alpha", "First"));

    let definitions = registry.get_openai_tool_definitions();
    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0]["function"]["name"], "alpha");
    assert_eq!(definitions[1]["function"]["name"], "zeta");

    let zeta = &definitions[1]["function"]["parameters"];
    assert_eq!(zeta["required"], serde_json::json!(["command"]));
    assert_eq!(zeta["properties"]["reset_cwd"]["default"], false);
}

#[tokio::test]
async fn test_registry_debug_formatting() {
    let mut registry = ToolRegistry::new();
    registry.register(TestTool::new("debug_tool", "Tool for debug testing"));

    let debug_str = format!("{:?}", registry);
    assert!(debug_str.contains("ToolRegistry"));
    assert!(debug_str.contains("tool_count: 1"));
}

#[tokio::test]
async fn test_concurrent_access() {
    let temp_dir = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    for i in 0..10 {
        registry.register(TestTool::new(&format!("tool_{}", i), &format!("Test tool {}", i)));
    }

    let registry = Arc::new(registry);
    let context = create_test_context(&temp_dir);
    let mut handles = Vec::new();

    for i in 0..10 {
        let registry = Arc::clone(&registry);
        let context = context.clone();
        handles.push(tokio::spawn(async move {
            let result = registry
                .execute_tool(&format!("tool_{}", i), ToolParameters::new(), &context)
                .await;
            assert!(result.success);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}
