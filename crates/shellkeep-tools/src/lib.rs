//! Tools that expose the persistent shell to a tool-calling host.

pub mod bash_tool;
pub mod project;

pub use bash_tool::{BashTool, BASH_TOOL_NAME};
pub use project::{Project, ProjectError};

use shellkeep_terminal::SharedSessionManager;
use shellkeep_toolcore::ToolRegistry;

/// Category under which the shell tools are registered
pub const SHELL_CATEGORY: &str = "shell";

/// Register the shell tools, all driving the same session manager
pub fn register_shell_tools(
    registry: &mut ToolRegistry,
    manager: SharedSessionManager,
    project: Project,
) {
    registry.register_with_categories(
        BashTool::new(manager, project),
        vec![SHELL_CATEGORY.to_string()],
    );
}
