use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::error::{Result, TerminalError};
use super::logger::SessionLogger;
use super::manager::SessionState;
use super::pty_handler::PtyTransport;
use super::sanitize::sanitize_output;
use super::transport::{RecvOutcome, ShellTransport};
use super::PROMPT_MARKER_PREFIX;

/// Session ID type
pub type SessionId = u32;

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

/// Shell session status
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SessionStatus {
    Running,
    Stopped,
    Exited(i32),
}

/// Session metadata
#[derive(Debug, Clone, Serialize)]
pub struct SessionMetadata {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub shell: String,
    /// Last directory the shell reported; may be stale after a `cd`
    pub working_dir: Option<PathBuf>,
    pub status: SessionStatus,
    pub pid: Option<u32>,
}

/// Why waiting for the prompt stopped short
enum PromptWait {
    TimedOut,
    Closed,
}

/// One live interactive shell with a negotiated sentinel prompt.
///
/// A value of this type only exists once the prompt has been seen, so a
/// session is either ready for commands or closed. Dropping it closes the
/// shell.
pub struct ShellSession {
    id: SessionId,
    transport: Box<dyn ShellTransport>,
    prompt: String,
    config: SessionConfig,
    logger: Option<SessionLogger>,
    metadata: SessionMetadata,
}

impl ShellSession {
    /// Spawn the configured shell in a PTY and prepare it for commands
    pub fn open(config: &SessionConfig, working_dir: Option<&Path>) -> Result<Self> {
        let transport = PtyTransport::spawn(config)?;
        Self::with_transport(Box::new(transport), config, working_dir)
    }

    /// Prepare an already running shell behind `transport` for commands
    pub fn with_transport(
        transport: Box<dyn ShellTransport>,
        config: &SessionConfig,
        working_dir: Option<&Path>,
    ) -> Result<Self> {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);

        let logger = match &config.transcript_dir {
            Some(dir) => Some(SessionLogger::new(id, dir)?),
            None => None,
        };

        let metadata = SessionMetadata {
            id,
            created_at: Utc::now(),
            shell: config.shell.clone(),
            working_dir: None,
            status: SessionStatus::Running,
            pid: transport.process_id(),
        };

        let mut session = Self {
            id,
            transport,
            prompt: new_prompt_marker(),
            config: config.clone(),
            logger,
            metadata,
        };

        // On any error below, dropping `session` shuts the shell down
        session.negotiate_prompt()?;
        if let Some(dir) = working_dir {
            session.change_directory(dir)?;
        }

        session.log_event("open", &session.config.shell.clone());
        session.record_metadata();
        info!(
            session_id = id,
            pid = ?session.metadata.pid,
            working_dir = ?session.metadata.working_dir,
            "shell session ready"
        );

        Ok(session)
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The sentinel prompt this shell prints after every command
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Get session metadata
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn process_id(&self) -> Option<u32> {
        self.metadata.pid
    }

    /// Whether the session still accepts commands
    pub fn is_open(&self) -> bool {
        self.metadata.status == SessionStatus::Running
    }

    /// Whether the shell process is still running
    pub fn is_alive(&mut self) -> bool {
        self.is_open() && self.transport.is_alive()
    }

    /// Directory recorded at setup or by the last `working_directory` call
    pub fn cached_working_dir(&self) -> Option<&Path> {
        self.metadata.working_dir.as_deref()
    }

    /// Run one command and return its cleaned output.
    ///
    /// Blocks until the prompt comes back or the command timeout passes. After
    /// a timeout the shell may still be busy with the command; only closing
    /// the session recovers from that.
    pub fn execute(&mut self, command: &str) -> Result<String> {
        if !self.is_open() {
            return Err(TerminalError::NotReady(SessionState::Closed));
        }

        let stale = self.transport.drain();
        if !stale.is_empty() {
            debug!(
                session_id = self.id,
                bytes = stale.len(),
                "discarding output received between commands"
            );
            self.log_output(&String::from_utf8_lossy(&stale));
        }

        let line = frame_command(command);
        self.log_input(&line);
        if let Err(e) = self.transport.write(line.as_bytes()) {
            self.mark_stopped("write failed");
            return Err(e);
        }

        let raw = match self.read_until_prompt(self.config.command_timeout) {
            Ok(raw) => raw,
            Err(PromptWait::TimedOut) => {
                warn!(
                    session_id = self.id,
                    command,
                    timeout_secs = self.config.command_timeout.as_secs_f64(),
                    "command did not finish in time"
                );
                self.log_event("timeout", command);
                return Err(TerminalError::CommandTimeout {
                    command: command.to_string(),
                    timeout: self.config.command_timeout,
                });
            }
            Err(PromptWait::Closed) => {
                self.mark_stopped("output closed");
                return Err(TerminalError::Transport(format!(
                    "shell exited while running: {command}"
                )));
            }
        };

        let output = sanitize_output(&raw, command);
        debug!(
            session_id = self.id,
            command,
            output_len = output.len(),
            "command finished"
        );
        Ok(output)
    }

    /// Ask the shell for its current directory and refresh the cache
    pub fn working_directory(&mut self) -> Result<PathBuf> {
        let output = self.execute("pwd")?;
        let dir = PathBuf::from(output.trim());
        self.metadata.working_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Ask the shell to exit, killing it if it does not within the grace
    /// period. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }

        if self.transport.is_alive() {
            self.log_input("exit\n");
            if let Err(e) = self.transport.write(b"exit\n") {
                debug!(session_id = self.id, "exit request not delivered: {e}");
            }

            let deadline = Instant::now() + self.config.exit_grace;
            while self.transport.is_alive() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }

            if self.transport.is_alive() {
                debug!(session_id = self.id, "shell ignored exit, killing");
                if let Err(e) = self.transport.kill() {
                    warn!(session_id = self.id, "failed to kill shell: {e}");
                }
            }
        }

        self.mark_stopped("closed");
        info!(session_id = self.id, "shell session closed");
    }

    fn negotiate_prompt(&mut self) -> Result<()> {
        // Written as two quoted halves so the echoed line never contains the
        // marker itself. Non-canonical input lifts the tty line length limit,
        // and without job control no "[1]+ Done" notices precede a prompt.
        let (head, tail) = self.prompt.split_at(self.prompt.len() / 2);
        let setup = format!(
            "stty -echo -icanon min 1 time 0 2>/dev/null; set +m; \
             unset PROMPT_COMMAND HISTFILE; PS2=''; PS1='{head}''{tail}'\n"
        );

        self.log_input(&setup);
        self.transport
            .write(setup.as_bytes())
            .map_err(|e| TerminalError::init(format!("could not configure the prompt: {e}")))?;

        match self.read_until_prompt(self.config.prompt_timeout) {
            Ok(_) => Ok(()),
            Err(PromptWait::TimedOut) => Err(TerminalError::init(format!(
                "{} did not show the prompt within {}s",
                self.config.shell,
                self.config.prompt_timeout.as_secs_f64()
            ))),
            Err(PromptWait::Closed) => {
                let code = self.transport.exit_code();
                Err(TerminalError::init(format!(
                    "{} exited during setup (exit code {:?})",
                    self.config.shell, code
                )))
            }
        }
    }

    fn change_directory(&mut self, dir: &Path) -> Result<()> {
        let requested = absolute_dir(dir, std::env::current_dir)?;
        let requested_str = requested.display().to_string();

        let output = self
            .execute(&format!("cd -- {} && pwd", shell_quote(&requested_str)))
            .map_err(|e| {
                TerminalError::init(format!("could not change directory to {requested_str}: {e}"))
            })?;

        let reported = output.lines().last().unwrap_or("").trim();
        if !same_directory(&requested, reported) {
            return Err(TerminalError::init(format!(
                "could not change directory to {requested_str}: {output}"
            )));
        }

        self.metadata.working_dir = Some(PathBuf::from(reported));
        Ok(())
    }

    /// Read until the sentinel prompt shows up and return everything before it
    fn read_until_prompt(&mut self, timeout: Duration) -> std::result::Result<String, PromptWait> {
        let deadline = Instant::now() + timeout;
        let marker = self.prompt.clone().into_bytes();
        let mut buffer: Vec<u8> = Vec::new();
        let mut scan_from = 0;

        loop {
            if let Some(pos) = find_marker(&buffer, &marker, scan_from) {
                let trailing = buffer.len() - pos - marker.len();
                if trailing > 0 {
                    debug!(session_id = self.id, trailing, "ignoring output after prompt");
                }
                buffer.truncate(pos);
                return Ok(String::from_utf8_lossy(&buffer).into_owned());
            }
            // The marker may straddle the next chunk boundary
            scan_from = buffer.len().saturating_sub(marker.len() - 1);

            match self.transport.recv(deadline) {
                RecvOutcome::Data(chunk) => {
                    self.log_output(&String::from_utf8_lossy(&chunk));
                    buffer.extend_from_slice(&chunk);
                }
                RecvOutcome::TimedOut => return Err(PromptWait::TimedOut),
                RecvOutcome::Closed => return Err(PromptWait::Closed),
            }
        }
    }

    fn mark_stopped(&mut self, reason: &str) {
        self.metadata.status = match self.transport.exit_code() {
            Some(code) => SessionStatus::Exited(code),
            None => SessionStatus::Stopped,
        };
        self.log_event("close", reason);
        self.record_metadata();
    }

    fn record_metadata(&mut self) {
        if let Some(logger) = self.logger.as_mut() {
            if let Err(e) = logger.write_metadata(&self.metadata) {
                warn!(session_id = self.id, "failed to write session metadata: {e}");
            }
        }
    }

    fn log_input(&mut self, data: &str) {
        if let Some(logger) = self.logger.as_mut() {
            if let Err(e) = logger.log_input(data) {
                warn!(session_id = self.id, "failed to write transcript: {e}");
            }
        }
    }

    fn log_output(&mut self, data: &str) {
        if let Some(logger) = self.logger.as_mut() {
            if let Err(e) = logger.log_output(data) {
                warn!(session_id = self.id, "failed to write transcript: {e}");
            }
        }
    }

    fn log_event(&mut self, event: &str, detail: &str) {
        if let Some(logger) = self.logger.as_mut() {
            if let Err(e) = logger.log_event(event, detail) {
                warn!(session_id = self.id, "failed to write transcript: {e}");
            }
        }
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("id", &self.id)
            .field("pid", &self.metadata.pid)
            .field("status", &self.metadata.status)
            .field("working_dir", &self.metadata.working_dir)
            .finish()
    }
}

fn new_prompt_marker() -> String {
    format!("{}{}> ", PROMPT_MARKER_PREFIX, Uuid::new_v4().simple())
}

/// Multi-line commands go in a brace group so the shell parses them as one
/// unit and prints a single prompt
fn frame_command(command: &str) -> String {
    let command = command.trim_end_matches(['\r', '\n']);
    if command.contains('\n') {
        format!("{{ {command}\n}}\n")
    } else {
        format!("{command}\n")
    }
}

/// `dir` made absolute against the directory `current_dir` reports
fn absolute_dir(
    dir: &Path,
    current_dir: impl FnOnce() -> std::io::Result<PathBuf>,
) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let base = current_dir().map_err(|e| {
        TerminalError::init(format!(
            "could not resolve {} against the current directory: {e}",
            dir.display()
        ))
    })?;
    Ok(base.join(dir))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn find_marker(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn same_directory(requested: &Path, reported: &str) -> bool {
    match (
        std::fs::canonicalize(requested),
        std::fs::canonicalize(reported),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => {
            let requested = requested.display().to_string();
            let requested = requested.trim_end_matches('/');
            !reported.is_empty() && requested == reported.trim_end_matches('/')
        }
    }
}
