//! # Evaluation Session
//!
//! Drives one probe loop from connection to a terminal [`Outcome`]:
//!
//! 1. `connect`: any error is a connect failure, nothing is armed.
//! 2. Mark the metrics start and arm the deadline at that instant.
//! 3. Cycle until the deadline flag is observed or a cycle error is
//!    classified as end-of-session or fatal.
//!
//! The deadline callback runs on the timer thread while a cycle may still be
//! in flight; it can only read the shared [`Metrics`].

use std::sync::Arc;
use std::time::Duration;

use crate::camera::CameraKind;
use crate::clock::Clock;
use crate::deadline::DeadlineScheduler;
use crate::error::ProbeError;
use crate::metrics::Metrics;
use crate::probe::{Disposition, ProbeLoop};

/// Immutable parameters of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub camera: CameraKind,
    pub duration: Duration,
}

/// Terminal state of a session.
#[derive(Debug)]
pub enum Outcome {
    /// The evaluation window elapsed.
    Completed,
    /// The link dropped mid-session; metrics so far are valid.
    ConnectionLost(ProbeError),
    /// The camera never answered the initial probe.
    ConnectFailed(ProbeError),
    /// An unexpected error stopped the loop.
    Aborted(ProbeError),
}

impl Outcome {
    /// Whether the session produced a report-worthy result.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::ConnectionLost(_))
    }
}

/// Run `probe` for `session.duration` after a successful connect.
///
/// `on_deadline` is invoked on the timer thread when the window elapses,
/// regardless of what the loop is doing at that moment.
pub fn evaluate<F>(
    probe: &mut dyn ProbeLoop,
    session: &Session,
    metrics: &Arc<Metrics>,
    clock: &dyn Clock,
    on_deadline: F,
) -> Outcome
where
    F: FnOnce() + Send + 'static,
{
    evaluate_with_start(probe, session, metrics, clock, || {}, on_deadline)
}

/// [`evaluate`], plus `on_start`, which runs on the caller's thread once the
/// connect succeeded and just before the window opens.
pub fn evaluate_with_start<S, F>(
    probe: &mut dyn ProbeLoop,
    session: &Session,
    metrics: &Arc<Metrics>,
    clock: &dyn Clock,
    on_start: S,
    on_deadline: F,
) -> Outcome
where
    S: FnOnce(),
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = probe.connect(metrics) {
        tracing::error!(camera = %session.camera, error = %e, "connection failed");
        return Outcome::ConnectFailed(e);
    }

    on_start();
    metrics.mark_started(clock.now());
    let deadline = DeadlineScheduler::arm(session.duration, on_deadline);
    tracing::info!(
        camera = %session.camera,
        duration_s = session.duration.as_secs(),
        "evaluation in progress"
    );

    let mut cycles: u64 = 0;
    loop {
        if deadline.expired() {
            tracing::info!(cycles, "evaluation complete");
            return Outcome::Completed;
        }
        match probe.run_cycle(metrics) {
            Ok(()) => cycles += 1,
            Err(e) => match probe.classify_error(&e) {
                Disposition::EndOfSession => {
                    tracing::warn!(cycles, error = %e, "connection lost");
                    return Outcome::ConnectionLost(e);
                }
                Disposition::Fatal => {
                    tracing::error!(cycles, error = %e, "probe loop failed");
                    return Outcome::Aborted(e);
                }
            },
        }
    }
}
