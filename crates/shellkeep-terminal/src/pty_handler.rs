use std::io::{Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, TerminalError};
use crate::transport::{RecvOutcome, ShellTransport};

/// Chunks buffered between the reader thread and the session
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Shell process attached to a pseudo-terminal.
///
/// A background thread pulls bytes off the PTY master and forwards them over a
/// channel, so waiting for output is a plain channel receive with a deadline.
pub struct PtyTransport {
    // Kept alive so the PTY is not torn down under the child
    _master: Box<dyn portable_pty::MasterPty + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: flume::Receiver<Vec<u8>>,
    reader_thread: Option<JoinHandle<()>>,
}

impl PtyTransport {
    /// Open a PTY and spawn the configured shell inside it
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        let pty_system = native_pty_system();

        let pty_pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TerminalError::init(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&config.shell);
        cmd.args(&config.shell_args);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pty_pair.slave.spawn_command(cmd).map_err(|e| {
            TerminalError::init(format!("failed to spawn {}: {e}", config.shell))
        })?;
        // Only the child should hold the slave side, otherwise EOF never arrives
        drop(pty_pair.slave);

        let master = pty_pair.master;
        let mut reader = master
            .try_clone_reader()
            .map_err(|e| TerminalError::init(format!("failed to clone PTY reader: {e}")))?;
        let writer = master
            .take_writer()
            .map_err(|e| TerminalError::init(format!("failed to take PTY writer: {e}")))?;

        debug!(
            shell = %config.shell,
            args = ?config.shell_args,
            pid = ?child.process_id(),
            "spawned shell in PTY"
        );

        let (tx, rx) = flume::bounded::<Vec<u8>>(OUTPUT_CHANNEL_CAPACITY);
        let reader_thread = thread::Builder::new()
            .name("shellkeep-pty-reader".to_string())
            .spawn(move || {
                let mut buffer = [0u8; 4096];
                loop {
                    match reader.read(&mut buffer) {
                        // EOF - process exited
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buffer[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            // Linux reports EIO once the slave side is gone
                            debug!("pty reader stopped: {e}");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| TerminalError::init(format!("failed to start PTY reader: {e}")))?;

        Ok(Self {
            _master: master,
            child,
            writer,
            output: rx,
            reader_thread: Some(reader_thread),
        })
    }
}

impl ShellTransport for PtyTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .and_then(|_| self.writer.flush())
            .map_err(|e| TerminalError::Transport(format!("failed to write to PTY: {e}")))
    }

    fn recv(&mut self, deadline: Instant) -> RecvOutcome {
        match self.output.recv_deadline(deadline) {
            Ok(chunk) => RecvOutcome::Data(chunk),
            Err(flume::RecvTimeoutError::Timeout) => RecvOutcome::TimedOut,
            Err(flume::RecvTimeoutError::Disconnected) => RecvOutcome::Closed,
        }
    }

    fn drain(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        while let Ok(chunk) = self.output.try_recv() {
            buf.extend_from_slice(&chunk);
        }
        buf
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .map_err(|e| TerminalError::Transport(format!("failed to kill shell: {e}")))?;
        // Reap so the process does not linger as a zombie
        let _ = self.child.try_wait();
        Ok(())
    }

    fn exit_code(&mut self) -> Option<i32> {
        self.child
            .try_wait()
            .ok()
            .flatten()
            .map(|status| status.exit_code() as i32)
    }

    fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        if self.is_alive() {
            if let Err(e) = self.kill() {
                warn!("failed to kill shell on drop: {e}");
            }
        }
        // Background jobs left behind by the shell still hold the slave side,
        // and the reader thread only sees EOF once they are gone too.
        if let Some(pid) = self.child.process_id() {
            kill_process_group(pid);
        }
        // Not joined: a process that left the group (setsid, nohup with its
        // own session) can keep the terminal open indefinitely.
        let _ = self.reader_thread.take();
    }
}

/// SIGKILL everything in the process group led by `pid`.
///
/// The shell leads its own session, and with job control off its background
/// jobs stay in its process group.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory of ours
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        // ESRCH: the group is already empty
        debug!(pgid, "process group not signalled: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

impl std::fmt::Debug for PtyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyTransport")
            .field("pid", &self.child.process_id())
            .finish()
    }
}
