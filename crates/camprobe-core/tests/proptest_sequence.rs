//! Property tests for HLS sequence accounting.
//!
//! A simulated live window slides forward by a random number of segments
//! between polls. Whatever the step sizes, every segment is either fetched
//! exactly once or booked as lost, never both.

use std::collections::VecDeque;
use std::sync::Arc;

use camprobe_core::clock::ManualClock;
use camprobe_core::probe::gopro::GoProProbe;
use camprobe_core::probe::http::SegmentSource;
use camprobe_core::probe::ProbeLoop;
use camprobe_core::{Metrics, ProbeError};
use proptest::prelude::*;

const WINDOW: u64 = 5;

struct SlidingWindow {
    manifests: VecDeque<String>,
    fetched: Vec<String>,
}

impl SlidingWindow {
    fn new(start: u64, steps: &[u64]) -> Self {
        let mut manifests = VecDeque::new();
        let mut seq = start;
        manifests.push_back(render(seq));
        for step in steps {
            seq += step;
            manifests.push_back(render(seq));
        }
        SlidingWindow {
            manifests,
            fetched: Vec::new(),
        }
    }
}

fn render(seq: u64) -> String {
    let mut m = format!("#EXTM3U\n#EXT-X-TARGETDURATION:1\n#EXT-X-MEDIA-SEQUENCE:{seq}\n");
    for s in seq..seq + WINDOW {
        m.push_str(&format!("#EXTINF:1.0,\n{s}.ts\n"));
    }
    m
}

impl SegmentSource for SlidingWindow {
    fn probe(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }

    fn fetch_manifest(&mut self) -> Result<String, ProbeError> {
        self.manifests
            .pop_front()
            .ok_or_else(|| ProbeError::Timeout("manifest".into()))
    }

    fn fetch_segment(&mut self, uri: &str) -> Result<u64, ProbeError> {
        self.fetched.push(uri.to_string());
        Ok(1)
    }
}

fn drive(start: u64, steps: &[u64]) -> (Vec<u64>, u64, u64) {
    let clock = ManualClock::new();
    let mut probe = GoProProbe::new(SlidingWindow::new(start, steps), 8, Arc::new(clock.clone()));
    let metrics = Metrics::new();
    while probe.run_cycle(&metrics).is_ok() {}
    let snap = metrics.snapshot(quanta::Instant::now());
    let fetched = probe
        .source()
        .fetched
        .iter()
        .map(|s| s.trim_end_matches(".ts").parse().unwrap())
        .collect();
    (fetched, snap.received_units, snap.lost_frames)
}

proptest! {
    #[test]
    fn gap_free_windows_lose_nothing(start in 0u64..10_000, steps in prop::collection::vec(0u64..=WINDOW, 1..40)) {
        let (fetched, received, lost) = drive(start, &steps);
        let last_seq = start + steps.iter().sum::<u64>();
        let expected: Vec<u64> = (start..last_seq + WINDOW).collect();
        prop_assert_eq!(&fetched, &expected);
        prop_assert_eq!(received, 8 * expected.len() as u64);
        prop_assert_eq!(lost, 0);
    }

    #[test]
    fn every_segment_is_fetched_or_lost(start in 0u64..10_000, steps in prop::collection::vec(0u64..3 * WINDOW, 1..40)) {
        let (fetched, received, lost) = drive(start, &steps);
        let last_seq = start + steps.iter().sum::<u64>();
        let total = last_seq + WINDOW - start;
        prop_assert!(fetched.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(received + lost, 8 * total);
    }
}
