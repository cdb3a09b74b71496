//! Reinit request flag
//!
//! Raised from MIDI callback threads, consumed by the run loop. A pass is
//! single-flight: [`ReinitSignal::try_begin`] hands out at most one
//! [`ReinitPass`] at a time, and the request is cleared only when that pass
//! is dropped, so a request raised mid-pass is satisfied by the pass already
//! running instead of starting another.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-wide request to re-discover and re-bind ports
#[derive(Debug, Default)]
pub struct ReinitSignal {
    requested: AtomicBool,
    running: AtomicBool,
    completed: AtomicU64,
}

impl ReinitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a reinit pass; safe from any thread
    pub fn raise(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// True while a pass is executing
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of passes that have completed
    pub fn completed_passes(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Start a pass if one is requested and none is running
    pub fn try_begin(&self) -> Option<ReinitPass<'_>> {
        if !self.is_raised() {
            return None;
        }
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReinitPass { signal: self })
    }
}

/// Exclusive right to run one reinit pass
///
/// Dropping it clears the request and releases the single-flight lock.
#[derive(Debug)]
pub struct ReinitPass<'a> {
    signal: &'a ReinitSignal,
}

impl Drop for ReinitPass<'_> {
    fn drop(&mut self) {
        self.signal.requested.store(false, Ordering::Release);
        self.signal.completed.fetch_add(1, Ordering::AcqRel);
        self.signal.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_no_pass_without_request() {
        let signal = ReinitSignal::new();
        assert!(signal.try_begin().is_none());
    }

    #[test]
    fn test_pass_clears_request_on_drop() {
        let signal = ReinitSignal::new();
        signal.raise();
        {
            let _pass = signal.try_begin().expect("pass");
            assert!(signal.is_running());
            assert!(signal.is_raised());
        }
        assert!(!signal.is_raised());
        assert!(!signal.is_running());
        assert_eq!(signal.completed_passes(), 1);
    }

    #[test]
    fn test_request_during_pass_is_coalesced() {
        let signal = ReinitSignal::new();
        signal.raise();
        let pass = signal.try_begin().expect("pass");

        signal.raise();
        assert!(signal.try_begin().is_none());

        drop(pass);
        assert!(!signal.is_raised());
        assert!(signal.try_begin().is_none());
        assert_eq!(signal.completed_passes(), 1);
    }

    #[test]
    fn test_concurrent_begin_is_single_flight() {
        let signal = Arc::new(ReinitSignal::new());
        signal.raise();
        let pass = signal.try_begin().expect("pass");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let signal = Arc::clone(&signal);
                std::thread::spawn(move || {
                    signal.raise();
                    signal.try_begin().is_some()
                })
            })
            .collect();
        for h in handles {
            assert!(!h.join().unwrap());
        }

        drop(pass);
        assert_eq!(signal.completed_passes(), 1);
    }
}
