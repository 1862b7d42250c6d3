//! # camprobe-core
//!
//! Link-quality evaluation engine for video-streaming cameras on a local
//! network. A probe loop hammers the camera for a fixed window while a
//! deadline thread waits to snapshot the accumulated counters.
//!
//! ## Crate structure
//!
//! - [`camera`] — Supported camera kinds and their display names
//! - [`config`] — TOML/CLI configuration, input → resolved split
//! - [`clock`] — Monotonic clock + sleep seam (mockable via `quanta`)
//! - [`metrics`] — Shared sent/received/lost counters
//! - [`deadline`] — One-shot evaluation timer on its own thread
//! - [`playlist`] — Live HLS media playlist parsing
//! - [`probe`] — The [`probe::ProbeLoop`] capability and its two adapters
//! - [`session`] — Connect → arm → cycle driver producing an [`session::Outcome`]
//! - [`report`] — Text/JSON rendering of the final snapshot

pub mod camera;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod error;
pub mod metrics;
pub mod playlist;
pub mod probe;
pub mod report;
pub mod session;

pub use camera::CameraKind;
pub use error::ProbeError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use session::{evaluate, evaluate_with_start, Outcome, Session};
