//! Process termination: flush the report once, then exit.
//!
//! The deadline thread and the main thread can both reach a terminal state.
//! Whichever arrives first runs the finish inside a `Once` and exits the
//! process; a late caller blocks in `call_once` until that exit lands.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Once};
use std::time::Duration;

use camprobe_core::clock::Clock;
use camprobe_core::report::{self, Report, ReportFormat, Status};
use camprobe_core::{CameraKind, Metrics};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

pub struct Finisher {
    once: Once,
    camera: CameraKind,
    expected: Duration,
    output: PathBuf,
    format: ReportFormat,
    metrics: Arc<Metrics>,
    clock: Arc<dyn Clock>,
}

impl Finisher {
    pub fn new(
        camera: CameraKind,
        expected: Duration,
        output: PathBuf,
        format: ReportFormat,
        metrics: Arc<Metrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            once: Once::new(),
            camera,
            expected,
            output,
            format,
            metrics,
            clock,
        }
    }

    fn report(&self, status: Status) -> Report {
        let snapshot = self.metrics.snapshot(self.clock.now());
        Report::new(self.camera, status, self.expected, &snapshot)
    }

    /// Write the report file, print the summary, exit 0.
    pub fn succeed(&self) -> ! {
        self.once.call_once(|| {
            let report = self.report(Status::Success);
            match report.write_to(&self.output, self.format) {
                Ok(()) => tracing::info!(path = %self.output.display(), "report written"),
                Err(e) => tracing::error!(
                    path = %self.output.display(),
                    error = %e,
                    "failed to write report"
                ),
            }
            print!("{}", report.render_console());
            let _ = io::stdout().flush();
            process::exit(EXIT_SUCCESS);
        });
        unreachable!("finish exits the process")
    }

    /// Print the failure banner, exit non-zero. No report file.
    pub fn fail(&self, reason: &str) -> ! {
        self.once.call_once(|| {
            print!("{}", report::title(Status::Failure));
            eprintln!("{reason}");
            println!("{}", report::HORIZONTAL_LINE);
            let _ = io::stdout().flush();
            process::exit(EXIT_FAILURE);
        });
        unreachable!("finish exits the process")
    }
}
