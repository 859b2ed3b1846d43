//! Transport abstraction between a shell session and the process behind it
use std::time::Instant;

use crate::error::Result;

/// Result of waiting for output from the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvOutcome {
    /// A chunk of raw output
    Data(Vec<u8>),
    /// Nothing arrived before the deadline
    TimedOut,
    /// The output stream ended; the process is gone
    Closed,
}

/// Raw byte pipe to an interactive shell process.
///
/// Implementations own the process exclusively. Sessions never assume any
/// framing: output arrives in arbitrary chunks and the session does its own
/// pattern matching.
pub trait ShellTransport: Send {
    /// Write bytes to the process input
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Block until a chunk arrives, the deadline passes or the stream closes
    fn recv(&mut self, deadline: Instant) -> RecvOutcome;

    /// Take whatever output is already buffered without waiting
    fn drain(&mut self) -> Vec<u8>;

    /// Check whether the process is still running
    fn is_alive(&mut self) -> bool;

    /// Forcibly terminate the process
    fn kill(&mut self) -> Result<()>;

    /// Exit code, if the process has exited
    fn exit_code(&mut self) -> Option<i32>;

    /// OS process id, if known
    fn process_id(&self) -> Option<u32>;
}
