use std::path::PathBuf;
use std::time::Duration;

use super::{
    DEFAULT_COLS, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_EXIT_GRACE_MILLIS,
    DEFAULT_PROMPT_TIMEOUT_SECS, DEFAULT_ROWS, DEFAULT_SHELL,
};

/// How a shell session is spawned and how long it may take to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub shell: String,
    pub shell_args: Vec<String>,
    /// Budget for the sentinel prompt to appear during setup.
    pub prompt_timeout: Duration,
    /// Budget for a submitted command to finish.
    pub command_timeout: Duration,
    /// How long `close` waits after `exit` before killing the process.
    pub exit_grace: Duration,
    pub cols: u16,
    pub rows: u16,
    pub env: Vec<(String, String)>,
    /// When set, every session writes a JSONL transcript into this directory.
    pub transcript_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            shell_args: default_args_for(DEFAULT_SHELL),
            prompt_timeout: Duration::from_secs(DEFAULT_PROMPT_TIMEOUT_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            exit_grace: Duration::from_millis(DEFAULT_EXIT_GRACE_MILLIS),
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            env: vec![("TERM".to_string(), "dumb".to_string())],
            transcript_dir: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell program. Arguments are reset to the defaults
    /// known for that shell; call `with_args` afterwards to override them.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self.shell_args = default_args_for(&self.shell);
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_exit_grace(mut self, grace: Duration) -> Self {
        self.exit_grace = grace;
        self
    }

    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Add or replace an environment variable for the spawned shell.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    pub fn with_transcript_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transcript_dir = Some(dir.into());
        self
    }
}

/// Bash gets no rc files and no readline, so the tty driver's echo setting is
/// the only thing that echoes input. Other shells run with no extra flags.
fn default_args_for(shell: &str) -> Vec<String> {
    let name = shell.rsplit('/').next().unwrap_or(shell);
    if name == "bash" {
        ["--noprofile", "--norc", "--noediting", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    }
}
