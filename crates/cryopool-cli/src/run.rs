//! Run command implementation for the cryopool CLI.
//!
//! Builds a pool, dispatches the requested number of demo tasks, and
//! reports progress and timing around the pool's call boundaries.

use anyhow::Context as _;

use cryopool_core::{Coordinator, PoolConfig};
use cryopool_util::{ProgressBar, Timing};
use cryopool_worker::stock::Payload;

/// Dispatch `actions` demo tasks across `workers` workers.
pub fn execute(
    workers: usize,
    actions: usize,
    base: u64,
    delay_ms: u64,
    no_suspend: bool,
) -> anyhow::Result<()> {
    let mut config = PoolConfig::default();
    if no_suspend {
        config = config.without_suspension();
    }

    let timing = Timing::labeled("Total");

    let mut pool =
        Coordinator::with_config(workers, config).context("failed to start worker pool")?;
    println!(
        "Pool ready: {} workers, pids {:?}",
        pool.worker_count(),
        pool.worker_pids()
    );

    let payload = Payload { base, delay_ms };
    let items: Vec<i64> = (0..actions as i64).collect();

    // One start_work call per chunk so the bar can advance between calls;
    // the pool only exposes call boundaries to observers.
    let mut bar = ProgressBar::new(actions, "Dispatching").with_end_message("Dispatch complete");
    let mut results: Vec<Option<u64>> = Vec::with_capacity(actions);
    for chunk in items.chunks(workers.max(1)) {
        let part = pool.start_work(chunk.len(), &payload, chunk)?;
        results.extend(part);
        bar.tick_by(chunk.len());
    }

    let completed = results.iter().filter(|r| r.is_some()).count();
    println!("Results: {:?}", results);
    println!("Completed {}/{} tasks", completed, actions);

    pool.deactivate();
    drop(timing);

    Ok(())
}
