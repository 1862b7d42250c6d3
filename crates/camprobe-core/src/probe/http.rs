//! HTTP access to the camera's live stream.
//!
//! [`SegmentSource`] is the seam between the HLS loop and the network: the
//! production [`HttpSource`] uses a blocking `ureq` agent, tests substitute
//! scripted sources.
//!
//! The short timeout bounds connecting, sending the request and waiting for
//! the response head, so only a stalled link ends the session. A slow body
//! that keeps arriving is allowed up to the separate body timeout.

use std::io;
use std::time::Duration;

use crate::config::GoProConfig;
use crate::error::{is_timeout_kind, ProbeError};
use crate::playlist::resolve_segment_url;

pub trait SegmentSource {
    /// Fetch the live manifest and drain it, discarding the body.
    fn probe(&mut self) -> Result<(), ProbeError>;

    /// Fetch the live manifest text.
    fn fetch_manifest(&mut self) -> Result<String, ProbeError>;

    /// Fetch one segment listed in the manifest and drain it. Returns the
    /// number of bytes read.
    fn fetch_segment(&mut self, uri: &str) -> Result<u64, ProbeError>;
}

/// Blocking HTTP client for the camera's HLS endpoint.
pub struct HttpSource {
    agent: ureq::Agent,
    manifest_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &GoProConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_connect(Some(config.timeout))
            .timeout_send_request(Some(config.timeout))
            .timeout_recv_response(Some(config.timeout))
            .timeout_recv_body(Some(config.body_timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            manifest_url: config.manifest_url(),
            timeout: config.timeout,
        }
    }

    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    fn get(&self, url: &str) -> Result<ureq::http::Response<ureq::Body>, ProbeError> {
        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| self.map_error(url, e))?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ProbeError::Http {
                status,
                url: url.to_string(),
            });
        }
        Ok(resp)
    }

    fn drain(&self, url: &str) -> Result<u64, ProbeError> {
        let mut resp = self.get(url)?;
        let mut reader = resp.body_mut().as_reader();
        io::copy(&mut reader, &mut io::sink()).map_err(|e| self.map_io(url, e))
    }

    fn map_error(&self, url: &str, e: ureq::Error) -> ProbeError {
        match e {
            ureq::Error::Timeout(_) => ProbeError::Timeout(format!("{url} ({:?})", self.timeout)),
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
                ProbeError::Unreachable(url.to_string())
            }
            ureq::Error::Io(io) => self.map_io(url, io),
            other => ProbeError::Io(io::Error::other(other)),
        }
    }

    fn map_io(&self, url: &str, e: io::Error) -> ProbeError {
        if is_timeout_kind(e.kind()) {
            return ProbeError::Timeout(format!("{url} ({:?})", self.timeout));
        }
        if let Some(inner) = e.get_ref().and_then(|i| i.downcast_ref::<ureq::Error>()) {
            if matches!(inner, ureq::Error::Timeout(_)) {
                return ProbeError::Timeout(format!("{url} ({:?})", self.timeout));
            }
        }
        match e.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable => ProbeError::Unreachable(url.to_string()),
            _ => ProbeError::Io(e),
        }
    }
}

impl SegmentSource for HttpSource {
    fn probe(&mut self) -> Result<(), ProbeError> {
        let url = self.manifest_url.clone();
        let bytes = self.drain(&url)?;
        tracing::debug!(url = %url, bytes, "live stream reachable");
        Ok(())
    }

    fn fetch_manifest(&mut self) -> Result<String, ProbeError> {
        let url = self.manifest_url.clone();
        let mut resp = self.get(&url)?;
        resp.body_mut()
            .read_to_string()
            .map_err(|e| self.map_error(&url, e))
    }

    fn fetch_segment(&mut self, uri: &str) -> Result<u64, ProbeError> {
        let url = resolve_segment_url(&self.manifest_url, uri);
        self.drain(&url)
    }
}
