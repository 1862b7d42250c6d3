use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::camera::CameraKind;

pub const DEFAULT_DURATION_SECS: u64 = 10;
pub const DEFAULT_SETTLE_SECS: u64 = 5;
/// Frames assumed per HLS segment when converting segment counts to frames.
pub const FRAMES_PER_SEGMENT: u64 = 8;

pub const DRONE_PEER: &str = "192.168.1.1:5555";
pub const DRONE_BIND: &str = "0.0.0.0:5555";
pub const DRONE_TRIGGER: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
pub const DRONE_BUFFER_SIZE: usize = 100 * 1024;
pub const DRONE_CONNECT_TIMEOUT_MS: u64 = 2000;
pub const DRONE_REPLY_TIMEOUT_MS: u64 = 100;

pub const GOPRO_BASE_URL: &str = "http://10.5.5.9:8080/live/";
pub const GOPRO_MANIFEST: &str = "amba.m3u8";
pub const GOPRO_TIMEOUT_MS: u64 = 5000;
/// Upper bound on draining one response body; the per-phase timeout above
/// only covers connecting and waiting for the response head.
pub const GOPRO_BODY_TIMEOUT_MS: u64 = 30_000;

// ─── Raw input (TOML) ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeConfigInput {
    pub camera: Option<CameraKind>,
    pub duration_secs: Option<i64>,
    pub settle_secs: Option<u64>,
    pub output: Option<PathBuf>,
    pub drone: DroneConfigInput,
    pub gopro: GoProConfigInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DroneConfigInput {
    pub peer: Option<String>,
    pub bind: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub reply_timeout_ms: Option<u64>,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoProConfigInput {
    pub base_url: Option<String>,
    pub manifest: Option<String>,
    pub timeout_ms: Option<u64>,
    pub body_timeout_ms: Option<u64>,
    pub frames_per_segment: Option<u64>,
}

// ─── Resolved config ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroneConfig {
    pub peer: SocketAddr,
    pub bind: SocketAddr,
    pub trigger: [u8; 4],
    pub connect_timeout: Duration,
    pub reply_timeout: Duration,
    pub buffer_size: usize,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            peer: SocketAddr::from(([192, 168, 1, 1], 5555)),
            bind: SocketAddr::from(([0, 0, 0, 0], 5555)),
            trigger: DRONE_TRIGGER,
            connect_timeout: Duration::from_millis(DRONE_CONNECT_TIMEOUT_MS),
            reply_timeout: Duration::from_millis(DRONE_REPLY_TIMEOUT_MS),
            buffer_size: DRONE_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoProConfig {
    /// Directory URL the manifest and relative segments live under.
    pub base_url: String,
    pub manifest: String,
    /// Connect and response-head timeout; a stall past this ends the session.
    pub timeout: Duration,
    /// Total time allowed to read one body.
    pub body_timeout: Duration,
    pub frames_per_segment: u64,
}

impl GoProConfig {
    pub fn manifest_url(&self) -> String {
        format!("{}{}", self.base_url, self.manifest)
    }
}

impl Default for GoProConfig {
    fn default() -> Self {
        Self {
            base_url: GOPRO_BASE_URL.to_string(),
            manifest: GOPRO_MANIFEST.to_string(),
            timeout: Duration::from_millis(GOPRO_TIMEOUT_MS),
            body_timeout: Duration::from_millis(GOPRO_BODY_TIMEOUT_MS),
            frames_per_segment: FRAMES_PER_SEGMENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub camera: CameraKind,
    pub duration: Duration,
    pub settle: Duration,
    pub output: Option<PathBuf>,
    pub drone: DroneConfig,
    pub gopro: GoProConfig,
}

impl ProbeConfig {
    pub fn new(camera: CameraKind) -> Self {
        Self {
            camera,
            duration: Duration::from_secs(DEFAULT_DURATION_SECS),
            settle: Duration::from_secs(DEFAULT_SETTLE_SECS),
            output: None,
            drone: DroneConfig::default(),
            gopro: GoProConfig::default(),
        }
    }

    pub fn from_toml_str(input: &str, camera: Option<CameraKind>) -> Result<Self, String> {
        let parsed: ProbeConfigInput = if input.trim().is_empty() {
            ProbeConfigInput::default()
        } else {
            toml::from_str(input).map_err(|e| format!("Invalid config TOML: {}", e))?
        };
        parsed.resolve(camera)
    }
}

/// Non-positive or absent durations fall back to the default window.
pub fn resolve_duration(secs: Option<i64>) -> Duration {
    match secs {
        Some(s) if s > 0 => Duration::from_secs(s as u64),
        _ => Duration::from_secs(DEFAULT_DURATION_SECS),
    }
}

impl ProbeConfigInput {
    /// Validate and fill defaults. `camera` overrides the file's choice.
    pub fn resolve(self, camera: Option<CameraKind>) -> Result<ProbeConfig, String> {
        let camera = camera
            .or(self.camera)
            .ok_or_else(|| "no camera selected".to_string())?;

        let defaults = DroneConfig::default();
        let drone = DroneConfig {
            peer: parse_addr(self.drone.peer.as_deref(), defaults.peer, "drone.peer")?,
            bind: parse_addr(self.drone.bind.as_deref(), defaults.bind, "drone.bind")?,
            trigger: DRONE_TRIGGER,
            connect_timeout: self
                .drone
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            reply_timeout: self
                .drone
                .reply_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reply_timeout),
            buffer_size: self.drone.buffer_size.unwrap_or(defaults.buffer_size).max(64),
        };

        let defaults = GoProConfig::default();
        let mut base_url = self
            .gopro
            .base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(format!("gopro.base_url must be an http(s) URL, got {base_url:?}"));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let gopro = GoProConfig {
            base_url,
            manifest: self
                .gopro
                .manifest
                .map(|m| m.trim().trim_start_matches('/').to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.manifest),
            timeout: self
                .gopro
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            body_timeout: self
                .gopro
                .body_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.body_timeout),
            frames_per_segment: self
                .gopro
                .frames_per_segment
                .filter(|f| *f > 0)
                .unwrap_or(defaults.frames_per_segment),
        };

        Ok(ProbeConfig {
            camera,
            duration: resolve_duration(self.duration_secs),
            settle: Duration::from_secs(self.settle_secs.unwrap_or(DEFAULT_SETTLE_SECS)),
            output: self.output,
            drone,
            gopro,
        })
    }
}

fn parse_addr(value: Option<&str>, default: SocketAddr, key: &str) -> Result<SocketAddr, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map_err(|e| format!("invalid {key} address '{v}': {e}")),
        None => Ok(default),
    }
}
