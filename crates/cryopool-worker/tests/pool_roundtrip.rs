//! End-to-end pool tests against the stock worker binary.
//!
//! Cargo builds the binary for this package before running these tests, so
//! the pool is pointed at it explicitly via `CARGO_BIN_EXE_cryopool-worker`.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cryopool_core::{Coordinator, Error, LifecycleController, LifecycleState, PoolConfig};
use cryopool_worker::stock::Payload;

fn config() -> PoolConfig {
    PoolConfig::default().with_worker_path(env!("CARGO_BIN_EXE_cryopool-worker"))
}

#[cfg(target_os = "linux")]
fn proc_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    stat.rsplit(')')
        .next()?
        .split_whitespace()
        .next()?
        .chars()
        .next()
}

#[test]
fn construction_suspends_every_worker() {
    let pool = Coordinator::with_config(3, config()).unwrap();

    assert_eq!(pool.worker_count(), 3);
    assert!(
        pool.lifecycle_states()
            .iter()
            .all(|s| *s == LifecycleState::Suspended)
    );

    #[cfg(target_os = "linux")]
    for pid in pool.worker_pids() {
        assert!(matches!(proc_state(pid), Some('T') | Some('t')));
    }

    pool.deactivate();
}

#[test]
fn ten_actions_over_four_workers_preserve_order() {
    let mut pool = Coordinator::with_config(4, config()).unwrap();

    let items: Vec<i64> = (0..10).collect();
    let results: Vec<Option<u64>> = pool.start_work(10, &Payload::new(100), &items).unwrap();

    assert_eq!(results.len(), 10);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(*result, Some(100 + i as u64));
    }

    pool.deactivate();
}

#[test]
fn without_items_each_worker_reports_its_index() {
    let mut pool = Coordinator::with_config(3, config()).unwrap();

    let results: Vec<Option<u64>> = pool
        .start_work(3, &Payload::new(10), &[] as &[i64])
        .unwrap();

    assert_eq!(results, vec![Some(10), Some(11), Some(12)]);

    pool.deactivate();
}

#[test]
fn short_item_list_leaves_trailing_positions_itemless() {
    let mut pool = Coordinator::with_config(2, config()).unwrap();

    let results: Vec<Option<u64>> = pool
        .start_work(5, &Payload::new(100), &[0i64, 1])
        .unwrap();

    // Positions 2.. carry no item, so the worker falls back to its index.
    assert_eq!(
        results,
        vec![Some(100), Some(101), Some(100), Some(101), Some(100)]
    );

    pool.deactivate();
}

#[test]
fn failed_work_surfaces_as_the_empty_sentinel() {
    let mut pool = Coordinator::with_config(2, config()).unwrap();

    let results: Vec<Option<u64>> = pool
        .start_work(2, &Payload::new(100), &[-1i64, 2])
        .unwrap();

    // The failure is indistinguishable from a genuinely empty result.
    assert_eq!(results, vec![None, Some(102)]);

    pool.deactivate();
}

#[test]
fn pool_is_reusable_across_requests_without_respawning() {
    let mut pool = Coordinator::with_config(2, config()).unwrap();
    let pids_before = pool.worker_pids();

    for round in 0..3u64 {
        let results: Vec<Option<u64>> = pool
            .start_work(4, &Payload::new(round * 1000), &[] as &[i64])
            .unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Some(round * 1000));
    }

    assert_eq!(pool.worker_pids(), pids_before);

    #[cfg(target_os = "linux")]
    for pid in pool.worker_pids() {
        assert!(matches!(proc_state(pid), Some('T') | Some('t')));
    }

    pool.deactivate();
}

#[test]
fn slow_worker_trips_the_result_deadline() {
    let mut pool = Coordinator::with_config(
        1,
        config().with_result_timeout(Some(Duration::from_millis(200))),
    )
    .unwrap();

    let payload = Payload {
        base: 0,
        delay_ms: 5_000,
    };
    let err = pool
        .start_work::<_, i64, u64>(1, &payload, &[])
        .unwrap_err();
    assert!(matches!(err, Error::ResultTimeout { worker: 0 }));
}

#[cfg(target_os = "linux")]
#[test]
fn deactivate_terminates_every_worker() {
    let pool = Coordinator::with_config(3, config()).unwrap();
    let pids = pool.worker_pids();

    pool.deactivate();

    for pid in pids {
        assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
    }
}

#[derive(Default)]
struct Recorder {
    running: Mutex<HashSet<u32>>,
    max_running: AtomicUsize,
    resumes: AtomicUsize,
    suspends: AtomicUsize,
}

/// Lifecycle controller that records transitions instead of signalling.
#[derive(Clone, Default)]
struct RecordingLifecycle(Arc<Recorder>);

impl LifecycleController for RecordingLifecycle {
    fn suspend(&self, pid: u32) -> cryopool_core::Result<()> {
        self.0.suspends.fetch_add(1, Ordering::SeqCst);
        self.0.running.lock().unwrap().remove(&pid);
        Ok(())
    }

    fn resume(&self, pid: u32) -> cryopool_core::Result<()> {
        self.0.resumes.fetch_add(1, Ordering::SeqCst);
        let mut running = self.0.running.lock().unwrap();
        running.insert(pid);
        self.0.max_running.fetch_max(running.len(), Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn at_most_worker_count_tasks_are_ever_running() {
    let recording = RecordingLifecycle::default();
    let mut pool =
        Coordinator::with_lifecycle(4, config(), Box::new(recording.clone())).unwrap();

    let results: Vec<Option<u64>> = pool
        .start_work(10, &Payload::new(0), &[] as &[i64])
        .unwrap();
    assert_eq!(results.len(), 10);

    assert!(recording.0.max_running.load(Ordering::SeqCst) <= 4);
    // One resume per task; one suspend per task plus one per worker at startup.
    assert_eq!(recording.0.resumes.load(Ordering::SeqCst), 10);
    assert_eq!(recording.0.suspends.load(Ordering::SeqCst), 4 + 10);

    pool.deactivate();
}
