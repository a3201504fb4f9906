//! Error types for cryopool-core.

use std::time::Duration;

use thiserror::Error;

/// Result type for cryopool-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cryopool-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid pool configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to spawn a worker process.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// A worker did not acknowledge startup in time. Fatal to construction.
    #[error("worker {worker} did not acknowledge startup within {timeout:?}")]
    HandshakeTimeout { worker: usize, timeout: Duration },

    /// No result arrived from a worker within the configured deadline.
    #[error("timed out waiting for a result from worker {worker}")]
    ResultTimeout { worker: usize },

    /// A lifecycle toggle targeted a process that no longer exists.
    #[error("worker process {pid} is no longer available")]
    ProcessUnavailable { pid: u32 },

    /// A lifecycle transition was signalled but never confirmed by the OS.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// The peer closed its end of the channel.
    #[error("channel closed by peer")]
    Disconnected,

    /// A receive deadline elapsed before any data arrived.
    ///
    /// Low-level variant produced by the channel layer; the pool maps it to
    /// [`Error::HandshakeTimeout`] or [`Error::ResultTimeout`].
    #[error("receive deadline elapsed")]
    RecvDeadline,

    /// IPC communication error with a worker process.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
