//! Pump watchdog and cross-thread interrupt.

use super::error::DriverError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Wall-clock budget for one `pump()` call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Watchdog {
    started: Instant,
    budget: Duration,
}

impl Watchdog {
    pub(crate) fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub(crate) fn check(&self) -> Result<(), DriverError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.budget {
            return Err(DriverError::PumpTimeout {
                elapsed,
                budget: self.budget,
            });
        }
        Ok(())
    }
}

/// Cloneable, thread-safe flag that aborts the running pump at its next
/// iteration. The abort skips `end_document`.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Consume a pending interrupt, re-arming the handle.
    pub(crate) fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::{InterruptHandle, Watchdog};
    use crate::html5::driver::DriverError;
    use std::time::Duration;

    #[test]
    fn generous_budget_passes() {
        let watchdog = Watchdog::start(Duration::from_secs(60));
        assert!(watchdog.check().is_ok());
    }

    #[test]
    fn zero_budget_trips_once_time_passes() {
        let watchdog = Watchdog::start(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        let err = watchdog.check().expect_err("budget exceeded");
        assert!(matches!(err, DriverError::PumpTimeout { budget, .. } if budget == Duration::ZERO));
        assert!(err.to_string().starts_with("pump exceeded time budget"));
    }

    #[test]
    fn interrupt_is_shared_across_clones_and_threads() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.interrupt())
            .join()
            .expect("interrupt thread");
        assert!(handle.is_interrupted());
        assert!(handle.take());
        assert!(!handle.is_interrupted());
        assert!(!handle.take());
    }
}
