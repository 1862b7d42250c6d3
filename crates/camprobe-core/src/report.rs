//! Final evaluation report: a flat text (or JSON) file plus a console
//! summary.

use std::fmt::Write;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::camera::CameraKind;
use crate::metrics::MetricsSnapshot;

pub const HORIZONTAL_LINE: &str =
    "------------------------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn title(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
        }
    }
}

/// Everything the report shows for one session.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub camera: CameraKind,
    pub camera_name: &'static str,
    pub status: Status,
    pub expected_duration_s: u64,
    pub actual_duration_s: f64,
    pub received_frames: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_packets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_packets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_frames: Option<u64>,
    pub loss_rate: f64,
}

impl Report {
    pub fn new(
        camera: CameraKind,
        status: Status,
        expected: Duration,
        snapshot: &MetricsSnapshot,
    ) -> Self {
        let (lost_packets, sent_packets, lost_frames, loss_rate) = match camera {
            CameraKind::ArDrone => (
                Some(snapshot.lost_packets),
                Some(snapshot.sent_packets),
                None,
                snapshot.packet_loss_rate(),
            ),
            CameraKind::GoPro => (None, None, Some(snapshot.lost_frames), snapshot.frame_loss_rate()),
        };
        Report {
            camera,
            camera_name: camera.name(),
            status,
            expected_duration_s: expected.as_secs(),
            actual_duration_s: snapshot.elapsed.as_secs_f64(),
            received_frames: snapshot.received_units,
            lost_packets,
            sent_packets,
            lost_frames,
            loss_rate,
        }
    }

    /// Metric lines shared by the file and the console.
    fn metric_lines(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Duration (expected): {} s", self.expected_duration_s);
        let _ = writeln!(out, "Duration (actual): {:.2} s", self.actual_duration_s);
        let _ = writeln!(out, "Received frames: {}", self.received_frames);
        if let Some(lost) = self.lost_packets {
            let _ = writeln!(out, "Lost packets: {lost}");
        }
        if let Some(sent) = self.sent_packets {
            let _ = writeln!(out, "Sent packets: {sent}");
        }
        if let Some(lost) = self.lost_frames {
            let _ = writeln!(out, "Lost frames: {lost}");
        }
        out
    }

    /// The text report file: camera name framed by `=` rules, then metrics.
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(self.camera_name.chars().count());
        let mut out = String::with_capacity(256);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", self.camera_name);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);
        out.push_str(&self.metric_lines());
        out
    }

    pub fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Json => self.render_json(),
        }
    }

    pub fn write_to(&self, path: &Path, format: ReportFormat) -> io::Result<()> {
        std::fs::write(path, self.render(format))
    }

    /// Console summary printed when the session ends.
    pub fn render_console(&self) -> String {
        let mut out = title(self.status);
        out.push_str(&self.metric_lines());
        let _ = writeln!(out, "Loss rate: {:.2} %", self.loss_rate * 100.0);
        let _ = writeln!(out, "{HORIZONTAL_LINE}");
        out
    }
}

/// `SUCCESS` / `FAILURE` banner framed by horizontal rules.
pub fn title(status: Status) -> String {
    format!("{HORIZONTAL_LINE}\n{}\n{HORIZONTAL_LINE}\n", status.title())
}
