use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use shellkeep_terminal::{SessionManager, SharedSessionManager};
use shellkeep_toolcore::{ToolContext, ToolParameters, ToolRegistry, ToolResult};
use shellkeep_tools::{register_shell_tools, BashTool, Project, BASH_TOOL_NAME};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::repl;

/// A one-shot command came back as an error result, which was already printed
#[derive(Debug)]
pub struct CommandFailed;

impl std::fmt::Display for CommandFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "command failed")
    }
}

impl std::error::Error for CommandFailed {}

/// Everything the binary wires together: one shell manager and a registry
/// holding the tools that drive it.
pub struct App {
    manager: SharedSessionManager,
    project: Project,
    registry: ToolRegistry,
}

impl App {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project = cli.project()?;
        let manager = SessionManager::new(cli.session_config()).into_shared();

        let mut registry = ToolRegistry::new();
        register_shell_tools(&mut registry, Arc::clone(&manager), project.clone());

        info!(root = %project.root_dir().display(), "shellkeep configured");
        Ok(Self {
            manager,
            project,
            registry,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// A tool handle with direct access to reset and working directory
    pub fn bash_tool(&self) -> BashTool {
        BashTool::new(Arc::clone(&self.manager), self.project.clone())
    }

    fn context(&self) -> ToolContext {
        ToolContext::new(
            self.project.root_dir().to_path_buf(),
            format!("shellkeep-{}", std::process::id()),
        )
    }

    /// Dispatch a command to the `bash` tool through the registry
    pub async fn run_command(&self, command: &str, reset_cwd: bool) -> ToolResult {
        let params = ToolParameters::new()
            .set("command", command)
            .set("reset_cwd", reset_cwd);
        self.registry
            .execute_tool(BASH_TOOL_NAME, params, &self.context())
            .await
    }

    /// Definitions of every registered tool, as pretty JSON
    pub fn tool_definitions(&self) -> Result<String> {
        let definitions = self.registry.get_openai_tool_definitions();
        serde_json::to_string_pretty(&definitions).context("Failed to encode tool definitions")
    }

    /// Shut the shell down explicitly instead of waiting for the last drop
    pub async fn shutdown(&self) {
        let mut guard = Arc::clone(&self.manager).lock_owned().await;
        if let Err(e) = tokio::task::spawn_blocking(move || guard.close()).await {
            eprintln!("{} failed to close shell: {}", "Warning:".yellow(), e);
        }
    }
}

/// Run the command line: one-shot, tool listing, or the interactive loop
pub async fn run(cli: Cli) -> Result<()> {
    let app = App::from_cli(&cli)?;

    let outcome = match &cli.command {
        Some(Commands::Run { command, reset_cwd }) => {
            let result = app.run_command(command, *reset_cwd).await;
            println!("{}", result.text());
            if result.success {
                Ok(())
            } else {
                Err(CommandFailed.into())
            }
        }
        Some(Commands::Tools) => app.tool_definitions().map(|json| println!("{json}")),
        None => repl::run_repl(&app).await,
    };

    app.shutdown().await;
    outcome
}
