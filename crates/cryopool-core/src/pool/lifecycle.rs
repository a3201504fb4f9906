//! OS-level suspend/resume of worker processes.
//!
//! Idle workers are stopped at the scheduler level so they consume no
//! quantum while staying resident; resuming them skips process-creation
//! cost entirely.

use std::time::Duration;

use crate::error::{Error, Result};

/// Toggles a worker process between suspended and runnable scheduling state.
///
/// Both operations are synchronous: they return only once the OS has
/// confirmed the transition. A target process that no longer exists yields
/// [`Error::ProcessUnavailable`], never silent success.
pub trait LifecycleController: Send + Sync {
    /// Stop the process from being scheduled. Idempotent: suspending an
    /// already-suspended process is benign.
    fn suspend(&self, pid: u32) -> Result<()>;

    /// Make the process schedulable again. Blocks until the OS confirms.
    fn resume(&self, pid: u32) -> Result<()>;
}

/// Suspend/resume via `SIGSTOP`/`SIGCONT`.
///
/// On Linux the scheduling state transition is confirmed by polling the
/// process state in `/proc/<pid>/stat`; elsewhere on unix the successful
/// signal delivery is the confirmation.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct SignalLifecycle {
    /// How long to wait for the OS to report the target state.
    confirm_timeout: Duration,
    /// Interval between process state checks.
    poll_interval: Duration,
}

#[cfg(unix)]
impl Default for SignalLifecycle {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_micros(200),
        }
    }
}

#[cfg(unix)]
impl SignalLifecycle {
    /// Wait until the process is (or is not) in the stopped state.
    #[cfg(target_os = "linux")]
    fn await_state(&self, pid: u32, stopped: bool) -> Result<()> {
        let deadline = std::time::Instant::now() + self.confirm_timeout;
        loop {
            match scheduling_state(pid)? {
                // Zombie or dead: the process can never be toggled again.
                'Z' | 'X' | 'x' => return Err(Error::ProcessUnavailable { pid }),
                'T' | 't' if stopped => return Ok(()),
                s if !stopped && s != 'T' && s != 't' => return Ok(()),
                _ => {}
            }
            if std::time::Instant::now() >= deadline {
                return Err(Error::Lifecycle(format!(
                    "process {} did not reach the {} state",
                    pid,
                    if stopped { "suspended" } else { "runnable" }
                )));
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    /// No procfs here; signal delivery already confirmed the process exists.
    #[cfg(not(target_os = "linux"))]
    fn await_state(&self, _pid: u32, _stopped: bool) -> Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
impl LifecycleController for SignalLifecycle {
    fn suspend(&self, pid: u32) -> Result<()> {
        send_signal(pid, libc::SIGSTOP)?;
        self.await_state(pid, true)
    }

    fn resume(&self, pid: u32) -> Result<()> {
        send_signal(pid, libc::SIGCONT)?;
        self.await_state(pid, false)
    }
}

/// Fallback controller that never actually suspends.
///
/// Idle workers stay blocked on their command channel, which costs no CPU
/// either; the only difference from [`SignalLifecycle`] is that the OS may
/// still schedule them briefly. Both operations still verify the target
/// process exists so a dead worker surfaces as [`Error::ProcessUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct KeepAliveLifecycle;

impl LifecycleController for KeepAliveLifecycle {
    fn suspend(&self, pid: u32) -> Result<()> {
        check_alive(pid)
    }

    fn resume(&self, pid: u32) -> Result<()> {
        check_alive(pid)
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> Result<()> {
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Err(Error::ProcessUnavailable { pid });
    }
    Err(Error::Io(err))
}

/// Signal 0 probes for existence without delivering anything.
#[cfg(unix)]
fn check_alive(pid: u32) -> Result<()> {
    send_signal(pid, 0)
}

#[cfg(not(unix))]
fn check_alive(_pid: u32) -> Result<()> {
    Ok(())
}

/// Read the single-character scheduling state from `/proc/<pid>/stat`.
///
/// The state is the first field after the parenthesized command name, which
/// may itself contain spaces and parentheses, so split on the last `)`.
#[cfg(target_os = "linux")]
fn scheduling_state(pid: u32) -> Result<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .map_err(|_| Error::ProcessUnavailable { pid })?;
    stat.rsplit(')')
        .next()
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|field| field.chars().next())
        .ok_or(Error::ProcessUnavailable { pid })
}
