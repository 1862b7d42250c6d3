use std::path::{Path, PathBuf};

use anyhow::Context;
use camprobe_core::config::{resolve_duration, ProbeConfig, ProbeConfigInput};
use camprobe_core::report::ReportFormat;
use camprobe_core::CameraKind;
use clap::{ArgGroup, Parser, ValueEnum};

/// Evaluate the video link quality of a camera.
#[derive(Parser, Debug)]
#[command(
    name = "camprobe",
    about = "Probe a camera's video link for a fixed window and report loss",
    group(ArgGroup::new("camera").required(true).args(["ar_drone", "go_pro"]))
)]
pub struct Cli {
    /// AR.Drone 1.0 (UDP keepalive on 192.168.1.1:5555).
    #[arg(short = 'a', long)]
    pub ar_drone: bool,

    /// GoPro (HLS live stream on 10.5.5.9:8080).
    #[arg(short = 'g', long)]
    pub go_pro: bool,

    /// Report file (default: <CAMERA>_[DD-MM-YYYY#HH:MM:SS]).
    #[arg(short = 'f', long, value_name = "FILENAME")]
    pub filename: Option<PathBuf>,

    /// Evaluation window in seconds; non-positive values mean 10.
    #[arg(short = 'd', long, value_name = "TIME", allow_negative_numbers = true)]
    pub duration: Option<i64>,

    /// TOML file with endpoint and timeout overrides.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report file format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Seconds to wait for the camera link before the first probe.
    #[arg(long, value_name = "SECS")]
    pub settle: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

impl Cli {
    pub fn camera(&self) -> CameraKind {
        if self.ar_drone {
            CameraKind::ArDrone
        } else {
            CameraKind::GoPro
        }
    }

    /// Merge the optional config file with command-line overrides.
    pub fn resolve(&self) -> anyhow::Result<ProbeConfig> {
        let input = match &self.config {
            Some(path) => load_config(path)?,
            None => ProbeConfigInput::default(),
        };
        let file_duration = input.duration_secs;
        let mut config = input
            .resolve(Some(self.camera()))
            .map_err(anyhow::Error::msg)?;

        if self.duration.is_some() || file_duration.is_none() {
            config.duration = resolve_duration(self.duration);
        }
        if let Some(settle) = self.settle {
            config.settle = std::time::Duration::from_secs(settle);
        }
        if let Some(path) = &self.filename {
            config.output = Some(path.clone());
        }
        Ok(config)
    }
}

fn load_config(path: &Path) -> anyhow::Result<ProbeConfigInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config TOML in {}", path.display()))
}

/// `<CAMERA>_[DD-MM-YYYY#HH:MM:SS]` in local time.
pub fn default_file_name(camera: CameraKind, now: chrono::DateTime<chrono::Local>) -> PathBuf {
    PathBuf::from(format!(
        "{}_[{}]",
        camera.tag(),
        now.format("%d-%m-%Y#%H:%M:%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("camprobe").chain(args.iter().copied()))
    }

    #[test]
    fn camera_flag_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-a", "-g"]).is_err());
        assert_eq!(parse(&["-g"]).unwrap().camera(), CameraKind::GoPro);
    }

    #[test]
    fn duration_defaults_and_overrides() {
        let cfg = parse(&["-a"]).unwrap().resolve().unwrap();
        assert_eq!(cfg.duration, Duration::from_secs(10));

        let cfg = parse(&["-a", "-d", "30"]).unwrap().resolve().unwrap();
        assert_eq!(cfg.duration, Duration::from_secs(30));

        let cfg = parse(&["-a", "-d", "-5"]).unwrap().resolve().unwrap();
        assert_eq!(cfg.duration, Duration::from_secs(10));
    }

    #[test]
    fn filename_and_settle_override() {
        let cli = parse(&["--go-pro", "-f", "out.txt", "--settle", "0", "--format", "json"]).unwrap();
        let cfg = cli.resolve().unwrap();
        assert_eq!(cfg.output, Some(PathBuf::from("out.txt")));
        assert_eq!(cfg.settle, Duration::ZERO);
        assert_eq!(ReportFormat::from(cli.format), ReportFormat::Json);
    }

    #[test]
    fn config_file_duration_survives_without_flag() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("camprobe.toml");
        std::fs::write(&path, "duration_secs = 42\n[drone]\nreply_timeout_ms = 20\n").unwrap();
        let cli = parse(&["-a", "-c", path.to_str().unwrap()]).unwrap();
        let cfg = cli.resolve().unwrap();
        assert_eq!(cfg.duration, Duration::from_secs(42));
        assert_eq!(cfg.drone.reply_timeout, Duration::from_millis(20));
    }

    #[test]
    fn default_file_name_format() {
        let now = chrono::Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(
            default_file_name(CameraKind::ArDrone, now),
            PathBuf::from("AR_DRONE_[07-03-2024#09:05:02]")
        );
    }
}
