//! The worker pool: coordinator, slots, and the suspend/resume lifecycle.

mod coordinator;
mod lifecycle;
mod slot;

pub use coordinator::Coordinator;
#[cfg(unix)]
pub use lifecycle::SignalLifecycle;
pub use lifecycle::{KeepAliveLifecycle, LifecycleController};
pub use slot::{LifecycleState, WorkerSlot};
