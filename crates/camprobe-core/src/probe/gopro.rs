//! GoPro HLS segment probe.
//!
//! Live HLS is polled, not pushed. Each cycle fetches the manifest, works out
//! which listed segments are new, downloads them, then paces itself to the
//! manifest's target duration. The media-sequence number is the only signal
//! of segments that aged out of the window before they could be fetched, so
//! a forward jump is booked as lost frames.

use std::sync::Arc;
use std::time::Duration;

use crate::camera::CameraKind;
use crate::clock::Clock;
use crate::error::ProbeError;
use crate::metrics::Metrics;
use crate::playlist::{MediaPlaylist, SequenceTracker};
use crate::probe::http::SegmentSource;
use crate::probe::{Disposition, ProbeLoop};

pub struct GoProProbe<S> {
    source: S,
    frames_per_segment: u64,
    clock: Arc<dyn Clock>,
    tracker: SequenceTracker,
}

impl<S: SegmentSource> GoProProbe<S> {
    pub fn new(source: S, frames_per_segment: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            frames_per_segment,
            clock,
            tracker: SequenceTracker::new(),
        }
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// How long to wait before the next manifest poll.
///
/// A stalled manifest is re-polled after half a target duration; otherwise
/// the rest of the target duration not already spent in this cycle.
pub fn pacing_delay(target: Duration, stalled: bool, spent: Duration) -> Duration {
    if stalled {
        target / 2
    } else {
        target.saturating_sub(spent)
    }
}

impl<S: SegmentSource> ProbeLoop for GoProProbe<S> {
    fn camera(&self) -> CameraKind {
        CameraKind::GoPro
    }

    fn connect(&mut self, _metrics: &Metrics) -> Result<(), ProbeError> {
        tracing::info!("connecting to GoPro live stream");
        self.source.probe()
    }

    fn run_cycle(&mut self, metrics: &Metrics) -> Result<(), ProbeError> {
        let cycle_start = self.clock.now();

        let text = self.source.fetch_manifest()?;
        let playlist = MediaPlaylist::parse(&text)?;
        let rec = self.tracker.reconcile(playlist.media_sequence);

        if rec.gap_segments > 0 {
            let frames = rec.gap_segments * self.frames_per_segment;
            tracing::warn!(
                media_sequence = playlist.media_sequence,
                segments = rec.gap_segments,
                frames,
                "manifest window skipped segments"
            );
            metrics.incr_lost_frames(frames);
        }

        let mut fetched = 0u32;
        for uri in playlist.segments.iter().skip(rec.skip) {
            let bytes = self.source.fetch_segment(uri)?;
            self.tracker.advance();
            metrics.incr_received(self.frames_per_segment);
            fetched += 1;
            tracing::trace!(uri = %uri, bytes, "segment fetched");
        }

        let spent = self.clock.now().saturating_duration_since(cycle_start);
        let delay = pacing_delay(playlist.target_duration, rec.stalled, spent);
        tracing::debug!(
            media_sequence = playlist.media_sequence,
            listed = playlist.segments.len(),
            fetched,
            stalled = rec.stalled,
            delay_ms = delay.as_millis() as u64,
            "manifest cycle"
        );
        self.clock.sleep(delay);
        Ok(())
    }

    fn classify_error(&self, err: &ProbeError) -> Disposition {
        if err.is_timeout() {
            Disposition::EndOfSession
        } else {
            Disposition::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::VecDeque;

    /// Serves queued manifests, then times out like a dropped link.
    #[derive(Default)]
    struct ScriptedSource {
        manifests: VecDeque<String>,
        fetched: Vec<String>,
        segment_cost: Duration,
        clock: Option<ManualClock>,
    }

    impl SegmentSource for ScriptedSource {
        fn probe(&mut self) -> Result<(), ProbeError> {
            Ok(())
        }

        fn fetch_manifest(&mut self) -> Result<String, ProbeError> {
            self.manifests
                .pop_front()
                .ok_or_else(|| ProbeError::Timeout("manifest".into()))
        }

        fn fetch_segment(&mut self, uri: &str) -> Result<u64, ProbeError> {
            if let Some(clock) = &self.clock {
                clock.advance(self.segment_cost);
            }
            self.fetched.push(uri.to_string());
            Ok(188)
        }
    }

    fn manifest(target: u64, seq: u64, count: u64) -> String {
        let mut m = format!("#EXTM3U\n#EXT-X-TARGETDURATION:{target}\n#EXT-X-MEDIA-SEQUENCE:{seq}\n");
        for s in seq..seq + count {
            m.push_str(&format!("#EXTINF:{target}.0,\nseg{s}.ts\n"));
        }
        m
    }

    fn probe_with(manifests: Vec<String>, clock: &ManualClock) -> GoProProbe<ScriptedSource> {
        let source = ScriptedSource {
            manifests: manifests.into(),
            ..Default::default()
        };
        GoProProbe::new(source, 8, Arc::new(clock.clone()))
    }

    #[test]
    fn pacing_delay_rules() {
        let two = Duration::from_secs(2);
        assert_eq!(pacing_delay(two, true, Duration::from_millis(300)), Duration::from_secs(1));
        assert_eq!(pacing_delay(two, false, Duration::from_millis(300)), Duration::from_millis(1700));
        assert_eq!(pacing_delay(two, false, Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn sliding_window_fetches_each_segment_once() {
        let clock = ManualClock::new();
        let mut probe = probe_with(
            vec![manifest(2, 10, 3), manifest(2, 11, 3), manifest(2, 12, 3)],
            &clock,
        );
        let metrics = Metrics::new();
        for _ in 0..3 {
            probe.run_cycle(&metrics).unwrap();
        }
        assert_eq!(
            probe.source().fetched,
            vec!["seg10.ts", "seg11.ts", "seg12.ts", "seg13.ts", "seg14.ts"]
        );
        let snap = metrics.snapshot(clock.now());
        assert_eq!(snap.received_units, 8 * 5);
        assert_eq!(snap.lost_frames, 0);
        assert_eq!(probe.tracker().next_expected(), Some(15));
    }

    #[test]
    fn sequence_jump_books_gap_loss() {
        let clock = ManualClock::new();
        let mut probe = probe_with(vec![manifest(2, 100, 1), manifest(2, 106, 1)], &clock);
        let metrics = Metrics::new();

        probe.run_cycle(&metrics).unwrap();
        // Next expected is 101; the window now starts at 106: 5 segments gone.
        probe.run_cycle(&metrics).unwrap();

        let snap = metrics.snapshot(clock.now());
        assert_eq!(snap.lost_frames, 8 * 5);
        assert_eq!(snap.received_units, 16);
        assert_eq!(probe.source().fetched, vec!["seg100.ts", "seg106.ts"]);
    }

    #[test]
    fn stalled_manifest_polls_at_half_target() {
        let clock = ManualClock::new();
        let mut probe = probe_with(vec![manifest(4, 50, 2), manifest(4, 50, 2)], &clock);
        let metrics = Metrics::new();
        probe.run_cycle(&metrics).unwrap();
        probe.run_cycle(&metrics).unwrap();

        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(4), Duration::from_secs(2)]
        );
        // Nothing new on the stalled poll.
        assert_eq!(metrics.snapshot(clock.now()).received_units, 16);
    }

    #[test]
    fn time_spent_downloading_shortens_the_sleep() {
        let clock = ManualClock::new();
        let source = ScriptedSource {
            manifests: vec![manifest(2, 1, 3)].into(),
            segment_cost: Duration::from_millis(400),
            clock: Some(clock.clone()),
            ..Default::default()
        };
        let mut probe = GoProProbe::new(source, 8, Arc::new(clock.clone()));
        probe.run_cycle(&Metrics::new()).unwrap();
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(800)]);
    }

    #[test]
    fn timeouts_end_the_session_gracefully() {
        let clock = ManualClock::new();
        let mut probe = probe_with(vec![], &clock);
        let err = probe.run_cycle(&Metrics::new()).unwrap_err();
        assert_eq!(probe.classify_error(&err), Disposition::EndOfSession);
    }

    #[test]
    fn malformed_manifest_is_fatal() {
        let clock = ManualClock::new();
        let mut probe = probe_with(vec!["#EXTM3U\nseg.ts\n".into()], &clock);
        let metrics = Metrics::new();
        let err = probe.run_cycle(&metrics).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedManifest(_)));
        assert_eq!(probe.classify_error(&err), Disposition::Fatal);
        assert_eq!(metrics.snapshot(clock.now()).received_units, 0);
    }
}
