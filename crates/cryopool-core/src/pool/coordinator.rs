//! Single-threaded coordinator owning the fixed worker set.
//!
//! The coordinator pre-forks every worker once at construction and then
//! toggles them between suspended and runnable around each task instead of
//! terminating and recreating them between batches.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::ipc::{WorkerCommand, WorkerResponse};

use super::lifecycle::{KeepAliveLifecycle, LifecycleController};
use super::slot::{LifecycleState, WorkerSlot};

/// Owner of the worker pool and the dispatch protocol.
///
/// Construction spawns `worker_count` workers, completes the startup
/// handshake with each, and suspends them all. A work request is split into
/// consecutive batches of at most `worker_count` tasks; within a batch the
/// coordinator resumes each slot and sends its task in slot order, then
/// collects results and re-suspends in the same order. Batches never
/// overlap, so at most `worker_count` tasks are ever in flight.
///
/// The coordinator runs single-threaded; sharing one across logical
/// producers requires external synchronization by the caller.
pub struct Coordinator {
    /// Fixed, ordered worker set. Membership never changes after
    /// construction; only per-slot lifecycle state does.
    slots: Vec<WorkerSlot>,
    /// Suspend/resume implementation.
    lifecycle: Box<dyn LifecycleController>,
    config: PoolConfig,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("worker_count", &self.slots.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a pool of `worker_count` workers with default configuration.
    pub fn new(worker_count: usize) -> Result<Self> {
        Self::with_config(worker_count, PoolConfig::default())
    }

    /// Create a pool with the given configuration.
    pub fn with_config(worker_count: usize, config: PoolConfig) -> Result<Self> {
        let lifecycle: Box<dyn LifecycleController> = if config.suspend_workers {
            suspending_lifecycle()
        } else {
            Box::new(KeepAliveLifecycle)
        };
        Self::with_lifecycle(worker_count, config, lifecycle)
    }

    /// Create a pool with an explicit lifecycle controller.
    ///
    /// Useful for instrumenting lifecycle transitions or substituting a
    /// platform-specific controller.
    pub fn with_lifecycle(
        worker_count: usize,
        config: PoolConfig,
        lifecycle: Box<dyn LifecycleController>,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(Error::Config("worker_count must be at least 1".to_string()));
        }

        let mut slots = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            slots.push(WorkerSlot::spawn(index, &config)?);
        }

        let mut pool = Self {
            slots,
            lifecycle,
            config,
        };

        // One acknowledgment per slot, then park it.
        for i in 0..worker_count {
            pool.slots[i].await_ready(pool.config.startup_timeout)?;
            let pid = pool.slots[i].pid();
            pool.lifecycle.suspend(pid)?;
            pool.slots[i].set_state(LifecycleState::Suspended);
        }

        tracing::debug!(worker_count, "pool ready, all workers suspended");
        Ok(pool)
    }

    /// Number of workers in the pool. Immutable for the pool's lifetime.
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Process IDs of all workers, in slot order.
    pub fn worker_pids(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.pid()).collect()
    }

    /// Lifecycle state of every slot, in slot order.
    pub fn lifecycle_states(&self) -> Vec<LifecycleState> {
        self.slots.iter().map(|s| s.state()).collect()
    }

    /// Dispatch `action_count` tasks and collect their results in order.
    ///
    /// `payload` is shared by every task; `items` vary per position. If
    /// `items` is shorter than `action_count`, the missing positions carry
    /// no item. The returned vector has exactly `action_count` entries in
    /// input order; `None` marks a task that produced no result or whose
    /// work function failed (the two are indistinguishable by design).
    pub fn start_work<P, I, R>(
        &mut self,
        action_count: usize,
        payload: &P,
        items: &[I],
    ) -> Result<Vec<Option<R>>>
    where
        P: Serialize,
        I: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(payload)
            .map_err(|e| Error::Serialization(format!("failed to encode payload: {}", e)))?;
        let items = items
            .iter()
            .map(|item| {
                serde_json::to_vec(item)
                    .map_err(|e| Error::Serialization(format!("failed to encode item: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.start_work_raw(action_count, &payload, &items)?
            .into_iter()
            .map(|reply| {
                reply
                    .map(|bytes| {
                        serde_json::from_slice(&bytes).map_err(|e| {
                            Error::Serialization(format!("failed to decode result: {}", e))
                        })
                    })
                    .transpose()
            })
            .collect()
    }

    /// Byte-level variant of [`Coordinator::start_work`] for callers that
    /// manage their own encoding.
    pub fn start_work_raw(
        &mut self,
        action_count: usize,
        payload: &[u8],
        items: &[Vec<u8>],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        let mut results = Vec::with_capacity(action_count);
        for (offset, count) in batch_plan(action_count, self.slots.len()) {
            self.run_batch(offset, count, payload, items, &mut results)?;
        }
        Ok(results)
    }

    /// Run one batch: resume and dispatch to slots `0..count`, then collect
    /// and re-suspend in the same order.
    fn run_batch(
        &mut self,
        offset: usize,
        count: usize,
        payload: &[u8],
        items: &[Vec<u8>],
        results: &mut Vec<Option<Vec<u8>>>,
    ) -> Result<()> {
        for i in 0..count {
            let pid = self.slots[i].pid();
            // Resume before sending so a large task frame cannot wedge
            // against a descheduled reader.
            self.lifecycle.resume(pid)?;
            self.slots[i].send(&WorkerCommand::Task {
                item: items.get(offset + i).cloned(),
                payload: payload.to_vec(),
            })?;
            self.slots[i].set_state(LifecycleState::Running);
        }

        for i in 0..count {
            let reply = match self.slots[i].recv(self.config.result_timeout) {
                Ok(reply) => reply,
                Err(Error::RecvDeadline) => return Err(Error::ResultTimeout { worker: i }),
                Err(e) => return Err(e),
            };
            let pid = self.slots[i].pid();
            self.lifecycle.suspend(pid)?;
            self.slots[i].set_state(LifecycleState::Suspended);

            results.push(match reply {
                WorkerResponse::Output { bytes } => Some(bytes),
                WorkerResponse::Empty => None,
                other => {
                    return Err(Error::Ipc(format!(
                        "unexpected response from worker {}: {:?}",
                        i, other
                    )));
                }
            });
        }

        Ok(())
    }

    /// Tear the pool down: forcibly terminate every worker with no drain
    /// handshake and release all slots.
    ///
    /// Consumes the coordinator, so any later use is a compile error.
    pub fn deactivate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        for slot in &mut self.slots {
            slot.kill();
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(unix)]
fn suspending_lifecycle() -> Box<dyn LifecycleController> {
    Box::new(super::lifecycle::SignalLifecycle::default())
}

#[cfg(not(unix))]
fn suspending_lifecycle() -> Box<dyn LifecycleController> {
    Box::new(KeepAliveLifecycle)
}

/// Split `action_count` units into consecutive `(offset, count)` batches of
/// at most `worker_count` tasks each.
fn batch_plan(action_count: usize, worker_count: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..action_count)
        .step_by(worker_count.max(1))
        .map(move |offset| (offset, worker_count.min(action_count - offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_plan_uneven_split() {
        let plan: Vec<_> = batch_plan(10, 4).collect();
        assert_eq!(plan, vec![(0, 4), (4, 4), (8, 2)]);
    }

    #[test]
    fn test_batch_plan_single_batch() {
        let plan: Vec<_> = batch_plan(3, 20).collect();
        assert_eq!(plan, vec![(0, 3)]);
    }

    #[test]
    fn test_batch_plan_exact_multiple() {
        let plan: Vec<_> = batch_plan(8, 4).collect();
        assert_eq!(plan, vec![(0, 4), (4, 4)]);
    }

    #[test]
    fn test_batch_plan_empty_request() {
        let plan: Vec<_> = batch_plan(0, 4).collect();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Coordinator::new(0).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
