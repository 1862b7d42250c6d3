use std::io;
use std::time::Duration;

use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────

/// Everything a probe loop can fail with.
///
/// Whether an error ends the session gracefully or aborts it is decided
/// per adapter by [`crate::probe::ProbeLoop::classify_error`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no reply from camera within {0:?}")]
    ConnectTimeout(Duration),
    #[error("camera unreachable: {0}")]
    Unreachable(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::ConnectTimeout(_) | ProbeError::Timeout(_))
    }
}

/// True for the error kinds a socket read timeout surfaces as.
///
/// Unix reports an expired `SO_RCVTIMEO` as `WouldBlock`, Windows as
/// `TimedOut`.
pub fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
