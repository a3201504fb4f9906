//! The stock demo work function shipped with the `cryopool-worker` binary.
//!
//! Computes `base + item` (or `base + worker_index` when no item was
//! supplied), optionally sleeping first to simulate per-task cost. Negative
//! items are rejected, which exercises the failure-sentinel path end to end.

use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Shared payload understood by the stock worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    /// Base added to every result.
    pub base: u64,
    /// Simulated per-task cost in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

impl Payload {
    /// Payload with no simulated cost.
    pub fn new(base: u64) -> Self {
        Self { base, delay_ms: 0 }
    }
}

/// The stock work function.
pub fn work(index: u32, payload: &Payload, item: Option<&i64>) -> anyhow::Result<Option<u64>> {
    if payload.delay_ms > 0 {
        std::thread::sleep(Duration::from_millis(payload.delay_ms));
    }
    match item {
        None => Ok(Some(payload.base + u64::from(index))),
        Some(&n) if n < 0 => bail!("negative item: {}", n),
        Some(&n) => Ok(Some(payload.base + n as u64)),
    }
}
