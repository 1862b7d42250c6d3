//! # Deadline Scheduler
//!
//! Arms a one-shot timer for the evaluation window. The timer runs on its own
//! thread, blocked in `recv_timeout` on a crossbeam channel; the probe loop
//! keeps running on the caller's thread and polls [`DeadlineHandle::expired`]
//! between cycles.
//!
//! ```text
//!   arm ──▶ Waiting ──timeout──▶ Expired (flag set, callback invoked once)
//!              │
//!         handle dropped
//!              ▼
//!          Cancelled (callback never runs)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use quanta::Instant;

/// Spawns deadline timers.
pub struct DeadlineScheduler;

impl DeadlineScheduler {
    /// Start the timer now. `on_expire` runs on the timer thread, at most
    /// once, after `duration` has elapsed, unless the returned handle is
    /// dropped first.
    pub fn arm<F>(duration: Duration, on_expire: F) -> DeadlineHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let expired = Arc::new(AtomicBool::new(false));
        let expired_clone = expired.clone();
        let armed_at = Instant::now();

        tracing::debug!(duration_ms = duration.as_millis() as u64, "deadline armed");

        let thread = thread::Builder::new()
            .name("deadline".into())
            .spawn(move || match cancel_rx.recv_timeout(duration) {
                Err(RecvTimeoutError::Timeout) => {
                    expired_clone.store(true, Ordering::SeqCst);
                    tracing::info!("evaluation window elapsed");
                    on_expire();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    tracing::trace!("deadline cancelled");
                }
            })
            .expect("failed to spawn deadline thread");

        DeadlineHandle {
            cancel: Some(cancel_tx),
            expired,
            armed_at,
            duration,
            thread: Some(thread),
        }
    }
}

/// Handle to an armed deadline. Dropping it cancels a timer that has not
/// fired yet.
pub struct DeadlineHandle {
    cancel: Option<Sender<()>>,
    expired: Arc<AtomicBool>,
    armed_at: Instant,
    duration: Duration,
    thread: Option<thread::JoinHandle<()>>,
}

impl DeadlineHandle {
    /// Whether the window has elapsed (set just before the callback runs).
    pub fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Time left in the window, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.armed_at.elapsed())
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Drop for DeadlineHandle {
    fn drop(&mut self) {
        // Disconnecting wakes the timer thread if it is still waiting.
        drop(self.cancel.take());
        if let Some(t) = self.thread.take() {
            if t.thread().id() != thread::current().id() {
                let _ = t.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn fires_once_after_duration() {
        let (tx, rx) = unbounded();
        let start = std::time::Instant::now();
        let handle = DeadlineScheduler::arm(Duration::from_millis(50), move || {
            tx.send(()).unwrap();
        });
        rx.recv_timeout(Duration::from_secs(2)).expect("callback fired");
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(handle.expired());
        assert_eq!(handle.remaining(), Duration::ZERO);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn drop_cancels_pending_timer() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let handle = DeadlineScheduler::arm(Duration::from_millis(200), move || {
            fired_clone.store(true, Ordering::SeqCst);
        });
        assert!(!handle.expired());
        assert!(handle.remaining() > Duration::ZERO);
        drop(handle);
        thread::sleep(Duration::from_millis(300));
        assert!(!fired.load(Ordering::SeqCst));
    }
}
