//! Inter-process communication with cryopool worker processes.
//!
//! This module provides the wire protocol and the per-worker channel pair
//! used by the coordinator and the worker runtime.

mod channel;
pub mod protocol;

pub use channel::ChannelPair;
pub use protocol::{WorkerCommand, WorkerResponse, read_message, write_message};
