//! Core engine for the cryopool worker-process pool.
//!
//! This crate provides:
//! - A coordinator that pre-forks a fixed set of worker processes once and
//!   round-robins batches of work across them
//! - OS-level suspend/resume of idle workers (no CPU while parked, no
//!   process-creation cost on the next task)
//! - The length-prefixed wire protocol and per-worker channel pairs
//!
//! The work computation itself lives in the worker binary; see the
//! `cryopool-worker` crate for the runtime a worker embeds.

pub mod config;
pub mod error;
pub mod ipc;
pub mod pool;

pub use config::PoolConfig;
pub use error::{Error, Result};
pub use ipc::{ChannelPair, WorkerCommand, WorkerResponse, read_message, write_message};
#[cfg(unix)]
pub use pool::SignalLifecycle;
pub use pool::{
    Coordinator, KeepAliveLifecycle, LifecycleController, LifecycleState, WorkerSlot,
};
