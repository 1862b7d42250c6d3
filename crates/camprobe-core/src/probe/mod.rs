//! # Probe Loops
//!
//! One [`ProbeLoop`] implementation per camera protocol:
//!
//! - [`drone::DroneProbe`] — UDP trigger/reply keepalive (AR.Drone 1.0)
//! - [`gopro::GoProProbe`] — HLS manifest polling + segment download (GoPro)
//!
//! Both share the same lifecycle, driven by [`crate::session::evaluate`]:
//!
//! ```text
//!   Connecting ──ok──▶ Evaluating ──deadline──▶ TerminatedOk
//!       │                  │
//!     error          classify_error
//!       ▼                  ├── EndOfSession ──▶ TerminatedOk (partial data)
//!   TerminatedFail         └── Fatal ─────────▶ TerminatedFail
//! ```

pub mod drone;
pub mod gopro;
pub mod http;

use crate::camera::CameraKind;
use crate::clock::Clock;
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::metrics::Metrics;
use std::sync::Arc;

/// What a cycle error means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Link dropped after real data arrived: finish and report success.
    EndOfSession,
    /// Unexpected failure: abort without a report.
    Fatal,
}

/// Protocol-specific probing capability.
pub trait ProbeLoop {
    fn camera(&self) -> CameraKind;

    /// Confirm the camera is reachable. Any error here is a connect failure.
    fn connect(&mut self, metrics: &Metrics) -> Result<(), ProbeError>;

    /// Run one probe cycle, updating `metrics`. Losses the protocol
    /// tolerates are counted here rather than returned.
    fn run_cycle(&mut self, metrics: &Metrics) -> Result<(), ProbeError>;

    fn classify_error(&self, err: &ProbeError) -> Disposition;
}

/// Build the adapter selected by `config.camera`.
pub fn build(config: &ProbeConfig, clock: Arc<dyn Clock>) -> Box<dyn ProbeLoop + Send> {
    match config.camera {
        CameraKind::ArDrone => Box::new(drone::DroneProbe::new(config.drone.clone())),
        CameraKind::GoPro => Box::new(gopro::GoProProbe::new(
            http::HttpSource::new(&config.gopro),
            config.gopro.frames_per_segment,
            clock,
        )),
    }
}
