//! Progress display and console utilities for cryopool callers.
//!
//! The pool core never depends on this crate. Callers wrap their
//! `start_work` invocations with these helpers for reporting; the pool
//! itself only observes call boundaries.

pub mod console;
pub mod progress;
pub mod timing;

#[cfg(unix)]
pub use console::SuppressStdout;
pub use progress::ProgressBar;
pub use timing::Timing;
