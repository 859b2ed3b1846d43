use std::time::Duration;

use thiserror::Error;

use crate::manager::SessionState;

#[derive(Debug, Error)]
pub enum TerminalError {
    /// The shell never produced the sentinel prompt, exited during setup, or
    /// could not be placed in the requested directory.
    #[error("shell session failed to initialize: {reason}")]
    SessionInit { reason: String },

    /// The sentinel prompt did not come back after a command was submitted.
    /// The shell may still be running the command.
    #[error("command timed out after {}s: {command}", timeout.as_secs_f64())]
    CommandTimeout { command: String, timeout: Duration },

    #[error("shell transport failed: {0}")]
    Transport(String),

    #[error("shell session is not ready (state: {0})")]
    NotReady(SessionState),

    #[error("transcript I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerminalError {
    pub(crate) fn init(reason: impl Into<String>) -> Self {
        Self::SessionInit {
            reason: reason.into(),
        }
    }

    /// Whether the session that produced this error can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::SessionInit { .. })
    }
}

pub type Result<T> = std::result::Result<T, TerminalError>;
