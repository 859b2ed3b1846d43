// Persistent shell session support
//
// This crate keeps a single interactive shell alive behind a pseudo-terminal,
// feeds it commands one at a time, detects completion through a negotiated
// prompt marker and hands back output with echo and escape sequences removed.

pub mod config;
pub mod error;
mod logger;
pub mod manager;
mod pty_handler;
pub mod sanitize;
pub mod session;
pub mod transport;

// Re-export public API
pub use config::SessionConfig;
pub use error::{Result, TerminalError};
pub use manager::{SessionManager, SessionState, SharedSessionManager};
pub use pty_handler::PtyTransport;
pub use sanitize::{sanitize_output, strip_ansi};
pub use session::{SessionId, SessionMetadata, SessionStatus, ShellSession};
pub use transport::{RecvOutcome, ShellTransport};

// Constants
pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_EXIT_GRACE_MILLIS: u64 = 500;
pub const DEFAULT_COLS: u16 = 200;
pub const DEFAULT_ROWS: u16 = 50;

/// Fixed head of every sentinel prompt; a per-session random suffix follows.
pub const PROMPT_MARKER_PREFIX: &str = "SHELLKEEP_";
