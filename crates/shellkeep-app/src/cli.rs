use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shellkeep_terminal::{SessionConfig, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PROMPT_TIMEOUT_SECS};
use shellkeep_tools::Project;

/// CLI arguments for shellkeep
#[derive(Parser, Debug)]
#[command(name = "shellkeep")]
#[command(about = "Run commands in a persistent bash session that keeps its state between calls")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root; every fresh shell starts here (default: current directory)
    #[arg(long, value_name = "DIR", env = "SHELLKEEP_ROOT")]
    pub root: Option<PathBuf>,

    /// Shell executable to run (default: /bin/bash)
    #[arg(long, value_name = "PATH", env = "SHELLKEEP_SHELL")]
    pub shell: Option<String>,

    /// Seconds to wait for a command before giving up
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS,
        env = "SHELLKEEP_COMMAND_TIMEOUT"
    )]
    pub timeout: u64,

    /// Seconds to wait for a new shell to show its prompt
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_PROMPT_TIMEOUT_SECS,
        env = "SHELLKEEP_PROMPT_TIMEOUT"
    )]
    pub prompt_timeout: u64,

    /// Write JSONL transcripts of every session into this directory
    #[arg(long, value_name = "DIR", env = "SHELLKEEP_TRANSCRIPT_DIR")]
    pub transcript_dir: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run a single command through the bash tool and print the result
    Run {
        /// Command to execute
        command: String,
        /// Start from a fresh shell in the project root
        #[arg(long)]
        reset_cwd: bool,
    },
    /// Print the tool definitions in OpenAI function-calling format
    Tools,
}

impl Cli {
    /// Session settings derived from the command line
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new()
            .with_command_timeout(Duration::from_secs(self.timeout))
            .with_prompt_timeout(Duration::from_secs(self.prompt_timeout));
        if let Some(shell) = &self.shell {
            config = config.with_shell(shell.as_str());
        }
        if let Some(dir) = &self.transcript_dir {
            config = config.with_transcript_dir(dir.as_path());
        }
        config
    }

    /// The validated project root
    pub fn project(&self) -> Result<Project> {
        match &self.root {
            Some(root) => Project::new(root.as_path())
                .with_context(|| format!("Invalid --root {}", root.display())),
            None => Project::current().context("Could not use the current directory as project root"),
        }
    }
}
