//! Pool configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Explicit path to the worker binary. When unset, the binary is
    /// resolved via `CRYOPOOL_WORKER_PATH`, the current executable's
    /// directory, the system PATH, then the development target directory.
    pub worker_path: Option<PathBuf>,

    /// Extra arguments passed to every worker process.
    pub worker_args: Vec<String>,

    /// How long construction waits for each worker's startup acknowledgment.
    pub startup_timeout: Duration,

    /// Deadline for each blocking result receive during a work request.
    /// `None` blocks indefinitely, which hangs the coordinator if a worker
    /// dies mid-task.
    pub result_timeout: Option<Duration>,

    /// Suspend idle workers at the OS scheduler level. When false (or on
    /// platforms without suspend support) idle workers stay blocked on
    /// their command channel instead; a performance difference only.
    pub suspend_workers: bool,

    /// Opaque setup bytes delivered to every worker in its startup frame.
    pub init_payload: Vec<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_path: None,
            worker_args: Vec::new(),
            startup_timeout: Duration::from_secs(10),
            result_timeout: Some(Duration::from_secs(60)),
            suspend_workers: true,
            init_payload: Vec::new(),
        }
    }
}

impl PoolConfig {
    /// Use a specific worker binary instead of the resolution ladder.
    pub fn with_worker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.worker_path = Some(path.into());
        self
    }

    /// Pass extra arguments to every worker process.
    pub fn with_worker_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.worker_args = args.into_iter().collect();
        self
    }

    /// Override the startup handshake deadline.
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Override the per-result receive deadline. `None` restores the
    /// original block-forever behavior.
    pub fn with_result_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.result_timeout = timeout;
        self
    }

    /// Keep idle workers blocked on their channel instead of suspending
    /// them at the scheduler level.
    pub fn without_suspension(mut self) -> Self {
        self.suspend_workers = false;
        self
    }

    /// Deliver setup bytes to every worker in its startup frame.
    pub fn with_init_payload(mut self, payload: Vec<u8>) -> Self {
        self.init_payload = payload;
        self
    }
}
