//! One pool member: a worker process plus its channel pair.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::ipc::{ChannelPair, WorkerCommand, WorkerResponse};

/// Scheduling lifecycle of one worker slot.
///
/// A slot is `Running` only between the coordinator sending a task and
/// receiving the corresponding result; it is `Suspended` at every other
/// time until `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Spawned, handshake not yet complete.
    Starting,
    /// Resident but descheduled; consumes no CPU.
    Suspended,
    /// Executing one task.
    Running,
    /// Killed by the coordinator.
    Terminated,
}

/// The coordinator's handle to one worker process.
///
/// Owns the child process and the exclusive channel pair to it. The
/// coordinator is the sole owner and is responsible for termination.
pub struct WorkerSlot {
    /// Stable ordinal in `[0, worker_count)`.
    index: usize,
    /// The worker process.
    child: Child,
    /// Command/result channel pair.
    channel: ChannelPair,
    /// Current scheduling lifecycle state.
    state: LifecycleState,
    /// Whether the worker has been killed.
    killed: bool,
}

impl WorkerSlot {
    /// Spawn a worker process and send its one-time startup frame.
    ///
    /// The slot is left in `Starting`; call [`WorkerSlot::await_ready`] to
    /// complete the handshake.
    pub fn spawn(index: usize, config: &PoolConfig) -> Result<Self> {
        let worker_path = find_worker_binary(config)?;

        let mut child = Command::new(&worker_path)
            .args(&config.worker_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Let worker stderr pass through for debugging
            .spawn()
            .map_err(|e| {
                Error::Spawn(format!(
                    "failed to spawn worker process '{}': {}",
                    worker_path.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn("failed to get worker stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("failed to get worker stdout".to_string()))?;

        let mut slot = Self {
            index,
            child,
            channel: ChannelPair::new(stdin, stdout),
            state: LifecycleState::Starting,
            killed: false,
        };

        // The startup frame replaces anything a forked worker would have
        // inherited implicitly: identity plus caller-supplied setup bytes.
        slot.send(&WorkerCommand::Init {
            index: index as u32,
            init_payload: config.init_payload.clone(),
        })?;

        Ok(slot)
    }

    /// Wait for the worker's startup acknowledgment.
    pub fn await_ready(&mut self, timeout: Duration) -> Result<()> {
        match self.channel.recv(Some(timeout)) {
            Ok(WorkerResponse::Ready) => Ok(()),
            Ok(other) => Err(Error::Ipc(format!(
                "unexpected handshake response from worker {}: {:?}",
                self.index, other
            ))),
            Err(Error::RecvDeadline) => Err(Error::HandshakeTimeout {
                worker: self.index,
                timeout,
            }),
            Err(e) => Err(e),
        }
    }

    /// Send a command to the worker.
    pub fn send(&mut self, command: &WorkerCommand) -> Result<()> {
        if self.killed {
            return Err(Error::Ipc(format!("worker {} has been killed", self.index)));
        }
        self.channel.send(command)
    }

    /// Receive one response from the worker.
    pub fn recv(&mut self, deadline: Option<Duration>) -> Result<WorkerResponse> {
        if self.killed {
            return Err(Error::Ipc(format!("worker {} has been killed", self.index)));
        }
        self.channel.recv(deadline)
    }

    /// Stable ordinal of this slot in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Process ID of the worker.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// Kill the worker process immediately, with no drain handshake, and
    /// reap it. Safe to call more than once.
    pub fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        self.state = LifecycleState::Terminated;

        if let Err(e) = self.child.kill() {
            // InvalidInput means the process already exited, which is fine
            if e.kind() != std::io::ErrorKind::InvalidInput {
                tracing::warn!("failed to kill worker {}: {}", self.index, e);
            }
        }

        // Wait to reap zombie
        let _ = self.child.wait();
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        // Ensure the worker is killed when the slot is dropped
        self.kill();
    }
}

/// Name of the stock worker binary.
const WORKER_BIN: &str = if cfg!(windows) {
    "cryopool-worker.exe"
} else {
    "cryopool-worker"
};

/// Resolve the worker binary path.
///
/// Order: explicit config path, `CRYOPOOL_WORKER_PATH`, the directory of
/// the current executable, the system PATH, then the development target
/// directory.
fn find_worker_binary(config: &PoolConfig) -> Result<PathBuf> {
    if let Some(path) = &config.worker_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(Error::Spawn(format!(
            "configured worker binary does not exist: {}",
            path.display()
        )));
    }

    if let Ok(path) = std::env::var("CRYOPOOL_WORKER_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let worker_path = exe_dir.join(WORKER_BIN);
        if worker_path.exists() {
            return Ok(worker_path);
        }
    }

    if let Ok(path) = which::which(WORKER_BIN) {
        return Ok(path);
    }

    // For development: try target/debug or target/release
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        for profile in &["debug", "release"] {
            let path = PathBuf::from(&manifest_dir)
                .join("..")
                .join("..")
                .join("target")
                .join(profile)
                .join(WORKER_BIN);
            if path.exists() {
                return Ok(path.canonicalize().unwrap_or(path));
            }
        }
    }

    Err(Error::Spawn(format!(
        "could not find {} binary; set CRYOPOOL_WORKER_PATH or ensure it is in PATH",
        WORKER_BIN
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_binary_is_an_error() {
        let config =
            PoolConfig::default().with_worker_path("/nonexistent/path/to/cryopool-worker");
        let err = find_worker_binary(&config).unwrap_err();
        assert!(matches!(err, Error::Spawn(_)));
    }
}
