//! Per-worker channel pair over the child's piped stdio.
//!
//! The command channel is the child's stdin, the result channel its stdout.
//! Each pair is exclusively owned by one coordinator/worker slot.

use std::io::BufWriter;
use std::process::{ChildStdin, ChildStdout};
use std::time::Duration;

use crate::error::{Error, Result};

use super::protocol::{WorkerCommand, WorkerResponse, read_message, write_message};

/// Bidirectional channel to one worker process.
pub struct ChannelPair {
    /// Buffered command send end (coordinator -> worker).
    command: BufWriter<ChildStdin>,
    /// Result receive end (worker -> coordinator). Unbuffered so the
    /// readiness poll in [`ChannelPair::recv`] sees the real fd state.
    result: ChildStdout,
}

impl ChannelPair {
    /// Wrap the piped stdio handles of a freshly spawned worker.
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            command: BufWriter::new(stdin),
            result: stdout,
        }
    }

    /// Send a command on the command channel.
    pub fn send(&mut self, command: &WorkerCommand) -> Result<()> {
        write_message(&mut self.command, command)
    }

    /// Receive one response from the result channel.
    ///
    /// With a deadline, waits for the channel to become readable first and
    /// returns [`Error::RecvDeadline`] if nothing arrives in time. Without
    /// one, blocks until a frame arrives or the worker closes the channel.
    pub fn recv(&mut self, deadline: Option<Duration>) -> Result<WorkerResponse> {
        if let Some(timeout) = deadline {
            self.await_readable(timeout)?;
        }
        read_message(&mut self.result)
    }

    #[cfg(unix)]
    fn await_readable(&self, timeout: Duration) -> Result<()> {
        use std::os::fd::AsRawFd;

        let mut fds = libc::pollfd {
            fd: self.result.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;

        loop {
            let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
            if rc > 0 {
                // Readable or hung up; either way the following read settles it.
                return Ok(());
            }
            if rc == 0 {
                return Err(Error::RecvDeadline);
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(Error::Io(err));
        }
    }

    /// Readiness polling is unsupported here; receives block until data
    /// arrives regardless of the configured deadline.
    #[cfg(not(unix))]
    fn await_readable(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}
