use std::fmt;

use serde::{Deserialize, Serialize};

/// Camera models the evaluator knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraKind {
    /// AR.Drone 1.0: UDP keepalive on the video port.
    ArDrone,
    /// GoPro: HTTP live streaming playlist.
    GoPro,
}

impl CameraKind {
    /// Human-readable model name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            CameraKind::ArDrone => "AR.Drone 1.0",
            CameraKind::GoPro => "GoPro",
        }
    }

    /// Identifier used as the default report file prefix.
    pub fn tag(self) -> &'static str {
        match self {
            CameraKind::ArDrone => "AR_DRONE",
            CameraKind::GoPro => "GO_PRO",
        }
    }

    /// What one received unit counts for this camera.
    pub fn unit(self) -> &'static str {
        match self {
            CameraKind::ArDrone => "packets",
            CameraKind::GoPro => "frames",
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_tags() {
        assert_eq!(CameraKind::ArDrone.name(), "AR.Drone 1.0");
        assert_eq!(CameraKind::GoPro.name(), "GoPro");
        assert_eq!(CameraKind::ArDrone.tag(), "AR_DRONE");
        assert_eq!(CameraKind::GoPro.to_string(), "GoPro");
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&CameraKind::GoPro).unwrap();
        assert_eq!(json, "\"go_pro\"");
        let kind: CameraKind = serde_json::from_str("\"ar_drone\"").unwrap();
        assert_eq!(kind, CameraKind::ArDrone);
    }
}
