use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::config::SessionConfig;
use super::error::{Result, TerminalError};
use super::session::ShellSession;

/// Manager handle shared between the owner and the tools it hands it to.
/// Every execute, reset and close goes through this one lock.
pub type SharedSessionManager = Arc<tokio::sync::Mutex<SessionManager>>;

/// Lifecycle of the managed shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No shell has been started yet
    Uninitialized,
    /// A shell is up with its prompt negotiated
    Ready,
    /// The shell was closed, failed, or is being replaced
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Owns at most one live shell session and drives it through its lifecycle
pub struct SessionManager {
    config: SessionConfig,
    session: Option<ShellSession>,
    state: SessionState,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("session", &self.session)
            .finish()
    }
}

impl SessionManager {
    /// Create a manager that starts its shell on the first `reset`
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Create a manager with a ready shell, optionally in `working_dir`
    pub fn open(config: SessionConfig, working_dir: Option<&Path>) -> Result<Self> {
        let mut manager = Self::new(config);
        manager.reset(working_dir)?;
        Ok(manager)
    }

    /// Wrap the manager for sharing with tools
    pub fn into_shared(self) -> SharedSessionManager {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The live session, if any
    pub fn session(&self) -> Option<&ShellSession> {
        self.session.as_ref()
    }

    /// Run a command in the current shell.
    ///
    /// If the shell dies while the command runs, the session is dropped and
    /// the manager moves to `Closed` so the next caller can start a new one.
    pub fn execute(&mut self, command: &str) -> Result<String> {
        let session = self.ready_session()?;
        let result = session.execute(command);
        self.check_fatal(&result);
        result
    }

    /// Ask the shell for its current directory
    pub fn working_directory(&mut self) -> Result<PathBuf> {
        let session = self.ready_session()?;
        let result = session.working_directory();
        self.check_fatal(&result);
        result
    }

    /// Replace the current shell with a fresh one.
    ///
    /// Works from any state. If the new shell cannot be started the manager
    /// is left `Closed`.
    pub fn reset(&mut self, working_dir: Option<&Path>) -> Result<()> {
        if let Some(mut previous) = self.session.take() {
            info!(session_id = previous.id(), "resetting shell session");
            previous.close();
        }
        self.state = SessionState::Closed;

        let session = ShellSession::open(&self.config, working_dir)?;
        self.session = Some(session);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Shut the shell down. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        if self.state != SessionState::Uninitialized {
            self.state = SessionState::Closed;
        }
    }

    fn ready_session(&mut self) -> Result<&mut ShellSession> {
        match (self.state, self.session.as_mut()) {
            (SessionState::Ready, Some(session)) => Ok(session),
            (state, _) => Err(TerminalError::NotReady(state)),
        }
    }

    fn check_fatal<T>(&mut self, result: &Result<T>) {
        if let Err(e) = result {
            if e.is_fatal() {
                warn!("dropping shell session after failure: {e}");
                self.close();
            }
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}
