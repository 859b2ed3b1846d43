// LLM tool implementation for the keep-alive bash session

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use shellkeep_terminal::{SessionManager, SessionState, SharedSessionManager, TerminalError};
use shellkeep_toolcore::tool_context::ToolContext;
use shellkeep_toolcore::{param, ParameterDefinition, Tool, ToolParameters, ToolResult};
use tracing::{debug, info, warn};

use crate::project::Project;

/// Name the tool is registered under
pub const BASH_TOOL_NAME: &str = "bash";

const DESCRIPTION: &str = "Execute a bash command in a keep-alive shell and return its output, \
or an error message if it failed. The shell persists between calls, so the working directory, \
environment variables and background jobs carry over.\n\n\
Use this tool to:\n\
- Create directories\n\
- Install dependencies\n\
- Start a development server\n\
- Run tests and linting\n\
- Run git operations\n\n\
Never use this tool for harmful or destructive operations. \
Set reset_cwd to start a fresh shell in the project root directory; this also recovers a shell \
that is stuck on a command that timed out.";

/// The `bash` tool: runs commands in one long-lived shell.
///
/// The session manager is owned by whoever constructs the tool; the tool only
/// borrows it through the shared lock for the length of each call.
pub struct BashTool {
    manager: SharedSessionManager,
    project: Project,
}

impl BashTool {
    pub fn new(manager: SharedSessionManager, project: Project) -> Self {
        Self { manager, project }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Run `command` and return its output as a fenced block.
    ///
    /// A new shell rooted at the project directory is started first when
    /// none is ready or when `reset_working_directory` is set. Failures come
    /// back as text starting with `Error: `.
    pub async fn run(&self, command: &str, reset_working_directory: bool) -> String {
        let owned_command = command.to_string();
        let result = self
            .with_manager(move |manager, root| {
                if reset_working_directory || manager.state() != SessionState::Ready {
                    debug!(
                        state = %manager.state(),
                        reset_working_directory,
                        "starting shell in project root"
                    );
                    manager.reset(Some(root))?;
                }
                manager.execute(&owned_command)
            })
            .await;

        match result {
            Ok(output) => format!("```\n{output}\n```"),
            Err(e) => {
                warn!(command, "bash tool failed: {e}");
                format!("Error: {e}")
            }
        }
    }

    /// Replace the shell with a fresh one in the project root
    pub async fn reset(&self) -> Result<(), TerminalError> {
        self.with_manager(|manager, root| manager.reset(Some(root)))
            .await?;
        info!(root = %self.project.root_dir().display(), "shell reset");
        Ok(())
    }

    /// Directory the shell is currently in, starting a shell if needed
    pub async fn working_directory(&self) -> Result<PathBuf, TerminalError> {
        self.with_manager(|manager, root| {
            if manager.state() != SessionState::Ready {
                manager.reset(Some(root))?;
            }
            manager.working_directory()
        })
        .await
    }

    /// Run blocking session work off the async runtime while holding the lock
    async fn with_manager<T, F>(&self, work: F) -> Result<T, TerminalError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SessionManager, &Path) -> Result<T, TerminalError> + Send + 'static,
    {
        let mut guard = Arc::clone(&self.manager).lock_owned().await;
        let root = self.project.root_dir().to_path_buf();

        tokio::task::spawn_blocking(move || work(&mut *guard, &root))
            .await
            .map_err(|e| TerminalError::Transport(format!("shell task failed: {e}")))?
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        BASH_TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> HashMap<String, ParameterDefinition> {
        HashMap::from([
            param!("command", "string", "The command to execute", required),
            param!(
                "reset_cwd",
                "boolean",
                "Whether to reset the current working directory to the project root directory",
                optional,
                false
            ),
        ])
    }

    async fn execute(&self, params: ToolParameters, context: &ToolContext) -> ToolResult {
        if context.work_dir != self.project.root_dir() {
            debug!(
                caller = %context.session_id,
                caller_dir = %context.work_dir.display(),
                root = %self.project.root_dir().display(),
                "caller directory differs from project root; the shell keeps its own directory"
            );
        }

        let command = match params.get_required::<String>("command") {
            Ok(command) => command,
            Err(e) => return ToolResult::error(format!("Error: {e}")),
        };
        let reset_cwd = match params.get_optional::<bool>("reset_cwd") {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => return ToolResult::error(format!("Error: {e}")),
        };

        debug!(caller = %context.session_id, command = %command, reset_cwd, "bash tool call");
        let text = self.run(&command, reset_cwd).await;
        if text.starts_with("Error: ") {
            ToolResult::error(text)
        } else {
            ToolResult::success(text)
        }
    }
}
