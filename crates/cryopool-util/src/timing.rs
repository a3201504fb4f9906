//! Wall-clock timing for arbitrary scopes.

use std::time::{Duration, Instant};

/// Measures the wall time of a scope and prints it when the guard drops.
pub struct Timing {
    label: Option<String>,
    start: Instant,
    reported: bool,
}

impl Timing {
    /// Unlabeled timer; reports as `Timed: <seconds>`.
    pub fn start() -> Self {
        Self {
            label: None,
            start: Instant::now(),
            reported: false,
        }
    }

    /// Labeled timer; reports as `<label>: <seconds>`.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            start: Instant::now(),
            reported: false,
        }
    }

    /// Elapsed time so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Report now instead of at scope end, returning the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.report();
        self.start.elapsed()
    }

    fn report(&mut self) {
        if self.reported {
            return;
        }
        self.reported = true;
        let secs = self.start.elapsed().as_secs_f64();
        match &self.label {
            Some(label) => println!("{}: {:.3}s", label, secs),
            None => println!("Timed: {:.3}s", secs),
        }
    }
}

impl Drop for Timing {
    fn drop(&mut self) {
        self.report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let timing = Timing::start();
        let first = timing.elapsed();
        assert!(timing.finish() >= first);
    }
}
