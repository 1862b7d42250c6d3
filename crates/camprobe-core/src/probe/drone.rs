//! AR.Drone 1.0 keepalive probe.
//!
//! The drone streams nothing until poked: every 4-byte trigger datagram sent
//! to its video port earns one reply datagram. Each cycle sends one trigger
//! and waits a short reply timeout; a missed reply is a lost packet, not a
//! disconnect. Only the much longer connect timeout at session start is a
//! hard failure.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::camera::CameraKind;
use crate::config::DroneConfig;
use crate::error::{is_timeout_kind, ProbeError};
use crate::metrics::Metrics;
use crate::probe::{Disposition, ProbeLoop};

pub struct DroneProbe {
    config: DroneConfig,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
}

impl DroneProbe {
    pub fn new(config: DroneConfig) -> Self {
        let buf = vec![0u8; config.buffer_size];
        Self {
            config,
            socket: None,
            buf,
        }
    }

    /// Local address of the probe socket once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

fn send_trigger(socket: &UdpSocket, trigger: &[u8], peer: SocketAddr) -> io::Result<()> {
    socket.send_to(trigger, peer)?;
    Ok(())
}

impl ProbeLoop for DroneProbe {
    fn camera(&self) -> CameraKind {
        CameraKind::ArDrone
    }

    fn connect(&mut self, metrics: &Metrics) -> Result<(), ProbeError> {
        let socket = UdpSocket::bind(self.config.bind)?;
        socket.set_read_timeout(Some(self.config.connect_timeout))?;

        tracing::info!(
            peer = %self.config.peer,
            local = ?socket.local_addr().ok(),
            "connecting to drone"
        );

        send_trigger(&socket, &self.config.trigger, self.config.peer)
            .map_err(|e| ProbeError::Unreachable(format!("{}: {e}", self.config.peer)))?;
        match socket.recv_from(&mut self.buf) {
            Ok((n, from)) => {
                tracing::info!(%from, bytes = n, "drone replied");
                metrics.record_probe(true);
            }
            Err(e) if is_timeout_kind(e.kind()) => {
                return Err(ProbeError::ConnectTimeout(self.config.connect_timeout));
            }
            Err(e) => return Err(e.into()),
        }

        socket.set_read_timeout(Some(self.config.reply_timeout))?;
        self.socket = Some(socket);
        Ok(())
    }

    fn run_cycle(&mut self, metrics: &Metrics) -> Result<(), ProbeError> {
        let (Some(socket), buf) = (&self.socket, &mut self.buf) else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "probe not connected").into());
        };

        let result = send_trigger(socket, &self.config.trigger, self.config.peer)
            .and_then(|()| socket.recv_from(buf));

        match result {
            Ok(_) => {
                metrics.record_probe(true);
                Ok(())
            }
            Err(e) if is_timeout_kind(e.kind()) => {
                tracing::trace!("drone reply timed out");
                metrics.record_probe(false);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn classify_error(&self, _err: &ProbeError) -> Disposition {
        // Reply timeouts never surface; anything that does is unexpected.
        Disposition::Fatal
    }
}
