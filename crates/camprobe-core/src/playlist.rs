//! Live HLS media playlist parsing and sequence reconciliation.
//!
//! Only the two directives that drive polling are interpreted:
//!
//! ```text
//! #EXTM3U
//! #EXT-X-TARGETDURATION:2
//! #EXT-X-MEDIA-SEQUENCE:1043
//! #EXTINF:2.000,
//! amba_hls-1043.ts
//! #EXTINF:2.000,
//! amba_hls-1044.ts
//! ```
//!
//! Every other `#` line is ignored; every non-empty line that does not start
//! with `#` is a segment URI.

use std::time::Duration;

use crate::error::ProbeError;

pub const TARGET_DURATION_TAG: &str = "#EXT-X-TARGETDURATION:";
pub const MEDIA_SEQUENCE_TAG: &str = "#EXT-X-MEDIA-SEQUENCE:";

/// One parsed manifest. Recreated on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPlaylist {
    pub target_duration: Duration,
    /// Sequence number of the first listed segment.
    pub media_sequence: u64,
    /// Segment URIs, oldest first.
    pub segments: Vec<String>,
}

impl MediaPlaylist {
    pub fn parse(text: &str) -> Result<Self, ProbeError> {
        let mut target_duration = None;
        let mut media_sequence = None;
        let mut segments = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(value) = line.strip_prefix(TARGET_DURATION_TAG) {
                target_duration = Some(parse_number(value, TARGET_DURATION_TAG)?);
            } else if let Some(value) = line.strip_prefix(MEDIA_SEQUENCE_TAG) {
                media_sequence = Some(parse_number(value, MEDIA_SEQUENCE_TAG)?);
            } else if !line.starts_with('#') {
                segments.push(line.to_string());
            }
        }

        let target_duration = target_duration.ok_or_else(|| {
            ProbeError::MalformedManifest(format!("missing {TARGET_DURATION_TAG}"))
        })?;
        let media_sequence = media_sequence.ok_or_else(|| {
            ProbeError::MalformedManifest(format!("missing {MEDIA_SEQUENCE_TAG}"))
        })?;

        Ok(MediaPlaylist {
            target_duration: Duration::from_secs(target_duration),
            media_sequence,
            segments,
        })
    }
}

fn parse_number(value: &str, tag: &str) -> Result<u64, ProbeError> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse()
        .map_err(|_| ProbeError::MalformedManifest(format!("bad value {value:?} for {tag}")))
}

// ─── Sequence Tracking ──────────────────────────────────────────────────────

/// Result of reconciling one manifest against what was already fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Listed segments already fetched in earlier cycles.
    pub skip: usize,
    /// Segments that aged out of the window before they could be fetched.
    pub gap_segments: u64,
    /// Media sequence unchanged since the previous manifest.
    pub stalled: bool,
}

/// Carries the sequence bookkeeping across poll cycles.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    next_expected: Option<u64>,
    last_media_sequence: Option<u64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the next segment not yet fetched.
    pub fn next_expected(&self) -> Option<u64> {
        self.next_expected
    }

    /// Compare a fresh manifest's media sequence with the next expected one.
    ///
    /// The first manifest only initializes the tracker. A manifest starting
    /// past the expected sequence means the window rolled over unfetched
    /// segments; the tracker jumps forward to the manifest's first segment.
    pub fn reconcile(&mut self, media_sequence: u64) -> Reconciliation {
        let stalled = self.last_media_sequence == Some(media_sequence);
        self.last_media_sequence = Some(media_sequence);

        let next = match self.next_expected {
            None => {
                self.next_expected = Some(media_sequence);
                return Reconciliation {
                    skip: 0,
                    gap_segments: 0,
                    stalled,
                };
            }
            Some(next) => next,
        };

        if media_sequence > next {
            self.next_expected = Some(media_sequence);
            Reconciliation {
                skip: 0,
                gap_segments: media_sequence - next,
                stalled,
            }
        } else {
            Reconciliation {
                skip: usize::try_from(next - media_sequence).unwrap_or(usize::MAX),
                gap_segments: 0,
                stalled,
            }
        }
    }

    /// Record one segment as fetched.
    pub fn advance(&mut self) {
        if let Some(next) = self.next_expected.as_mut() {
            *next += 1;
        }
    }
}

/// Resolve a segment URI from the manifest against the manifest URL.
pub fn resolve_segment_url(manifest_url: &str, uri: &str) -> String {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return uri.to_string();
    }
    if let Some(path) = uri.strip_prefix('/') {
        let origin_end = manifest_url
            .find("://")
            .map(|scheme| {
                let rest = &manifest_url[scheme + 3..];
                scheme + 3 + rest.find('/').unwrap_or(rest.len())
            })
            .unwrap_or(0);
        return format!("{}/{}", &manifest_url[..origin_end], path);
    }
    match manifest_url.rfind('/') {
        Some(idx) => format!("{}{}", &manifest_url[..=idx], uri),
        None => uri.to_string(),
    }
}
