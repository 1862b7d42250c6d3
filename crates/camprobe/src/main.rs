//! # camprobe
//!
//! Measures the video link quality of a camera on the local network by
//! probing it for a fixed window and tallying delivered and lost units.
//!
//! ## Usage
//!
//! ```bash
//! # AR.Drone 1.0, 30 second window, explicit report file
//! camprobe --ar-drone --duration 30 --filename drone.txt
//!
//! # GoPro with endpoint overrides from a config file
//! camprobe --go-pro --config camprobe.toml --format json
//! ```
//!
//! Exit status is 0 when the window elapses (or a GoPro stream drops after
//! data arrived) and 1 when the camera never answers or the probe fails.

mod cli;
mod finish;

use std::sync::Arc;

use camprobe_core::clock::{Clock, SystemClock};
use camprobe_core::{evaluate_with_start, probe, Metrics, Outcome, Session};
use clap::Parser;

use crate::finish::Finisher;

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // ── Configuration ───────────────────────────────────────────
    let cli = cli::Cli::parse();
    let config = cli.resolve()?;
    let output = config
        .output
        .clone()
        .unwrap_or_else(|| cli::default_file_name(config.camera, chrono::Local::now()));

    tracing::info!(
        camera = %config.camera,
        duration_s = config.duration.as_secs(),
        output = %output.display(),
        "camprobe starting"
    );

    // ── Session ─────────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let metrics = Arc::new(Metrics::new());
    let session = Session {
        camera: config.camera,
        duration: config.duration,
    };
    let finisher = Arc::new(Finisher::new(
        config.camera,
        config.duration,
        output,
        cli.format.into(),
        metrics.clone(),
        clock.clone(),
    ));

    println!("Connecting to {}...", config.camera);
    clock.sleep(config.settle);

    let mut probe = probe::build(&config, clock.clone());
    let on_deadline = {
        let finisher = finisher.clone();
        move || {
            finisher.succeed();
        }
    };

    let on_start = || println!("Evaluation in progress...");

    match evaluate_with_start(
        probe.as_mut(),
        &session,
        &metrics,
        clock.as_ref(),
        on_start,
        on_deadline,
    ) {
        Outcome::Completed => finisher.succeed(),
        Outcome::ConnectionLost(_) => {
            println!("Connection lost");
            finisher.succeed()
        }
        Outcome::ConnectFailed(e) => finisher.fail(&format!("Connection failed: {e}")),
        Outcome::Aborted(e) => {
            tracing::error!(error = %e, "evaluation aborted");
            std::process::exit(finish::EXIT_FAILURE)
        }
    }
}
