//! # Evaluation Metrics
//!
//! Counters written by the active probe loop and read by the deadline
//! callback on another thread. A single mutex guards all four counters so a
//! snapshot never observes a probe that was sent but not yet resolved.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use quanta::Instant;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    sent_packets: u64,
    received_units: u64,
    lost_packets: u64,
    lost_frames: u64,
}

/// Shared metrics context for one evaluation session.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: Mutex<Counters>,
    started_at: OnceLock<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<F: FnOnce(&mut Counters)>(&self, f: F) {
        let mut c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut c);
    }

    pub fn incr_sent(&self) {
        self.with(|c| c.sent_packets += 1);
    }

    pub fn incr_received(&self, units: u64) {
        self.with(|c| c.received_units += units);
    }

    pub fn incr_lost_packets(&self) {
        self.with(|c| c.lost_packets += 1);
    }

    pub fn incr_lost_frames(&self, frames: u64) {
        self.with(|c| c.lost_frames += frames);
    }

    /// Record one request/response probe: a send plus its single outcome.
    pub fn record_probe(&self, delivered: bool) {
        self.with(|c| {
            c.sent_packets += 1;
            if delivered {
                c.received_units += 1;
            } else {
                c.lost_packets += 1;
            }
        });
    }

    /// Mark the start of the evaluation window. Later calls are ignored.
    pub fn mark_started(&self, at: Instant) {
        let _ = self.started_at.set(at);
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at.get().copied()
    }

    /// Consistent copy of the counters plus time elapsed since the start
    /// mark (zero if the evaluation never started).
    pub fn snapshot(&self, now: Instant) -> MetricsSnapshot {
        let c = *self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = self
            .started_at
            .get()
            .map(|start| now.saturating_duration_since(*start))
            .unwrap_or_default();
        MetricsSnapshot {
            sent_packets: c.sent_packets,
            received_units: c.received_units,
            lost_packets: c.lost_packets,
            lost_frames: c.lost_frames,
            elapsed,
        }
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub sent_packets: u64,
    /// Packets (UDP) or frames (HLS) delivered.
    pub received_units: u64,
    pub lost_packets: u64,
    pub lost_frames: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    /// Lost / sent for the request-response probe.
    pub fn packet_loss_rate(&self) -> f64 {
        if self.sent_packets == 0 {
            0.0
        } else {
            self.lost_packets as f64 / self.sent_packets as f64
        }
    }

    /// Lost / (received + lost) frames for the segment probe.
    pub fn frame_loss_rate(&self) -> f64 {
        let total = self.received_units + self.lost_frames;
        if total == 0 {
            0.0
        } else {
            self.lost_frames as f64 / total as f64
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
