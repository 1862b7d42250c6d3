//! Time source for pacing and elapsed-time measurement.
//!
//! The HLS loop sleeps between manifest polls; routing those sleeps through
//! [`Clock`] lets tests drive a `quanta` mock clock and inspect every pause
//! without waiting in real time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use quanta::Instant;

/// Monotonic time plus a blocking sleep.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, dur: Duration);
}

/// Wall clock backed by the global `quanta` clock and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, dur: Duration) {
        if !dur.is_zero() {
            std::thread::sleep(dur);
        }
    }
}

/// Mock clock: `sleep` advances time instantly and records the request.
#[derive(Clone)]
pub struct ManualClock {
    clock: quanta::Clock,
    mock: Arc<quanta::Mock>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let (clock, mock) = quanta::Clock::mock();
        Self {
            clock,
            mock,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Move time forward without recording a sleep (simulates work).
    pub fn advance(&self, dur: Duration) {
        self.mock.increment(dur);
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn sleep(&self, dur: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(dur);
        self.mock.increment(dur);
    }
}
