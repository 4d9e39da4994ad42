//! UDP transport tuned for minimum latency.
//!
//! One IPv4 socket per endpoint, configured before bind. Address reuse
//! lets a restarted endpoint reclaim the port immediately, and the 1 MiB
//! kernel buffers ride out scheduling hiccups without dropping the
//! robot's 4 ms cadence. The socket is non-blocking so the engine loop
//! can interleave the liveness watchdog with receives.

use crate::config::RsiConfig;
use crate::error::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};

/// Kernel buffer size for both directions.
const SOCKET_BUFFER_SIZE: usize = 1024 * 1024;

/// The endpoint's bound, tuned, non-blocking UDP socket.
#[derive(Debug)]
pub(crate) struct RsiSocket {
    socket: UdpSocket,
}

impl RsiSocket {
    /// Create, tune, and bind the endpoint socket.
    ///
    /// Bind and non-blocking configuration failures are fatal; buffer
    /// sizing failures are diagnostics only (the kernel clamps to its
    /// limits and the endpoint still works).
    pub fn open(config: &RsiConfig) -> Result<Self> {
        let ip = config.bind_ip().map_err(|_| Error::SocketFailed)?;
        let addr = SocketAddrV4::new(ip, config.port);

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(|e| {
            log::error!("Failed to create socket: {}", e);
            Error::SocketFailed
        })?;

        if let Err(e) = socket.set_reuse_address(true) {
            if config.verbose {
                log::warn!("setsockopt(SO_REUSEADDR) failed: {}", e);
            }
        }
        if let Err(e) = socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE) {
            if config.verbose {
                log::warn!("setsockopt(SO_RCVBUF) failed: {}", e);
            }
        }
        if let Err(e) = socket.set_send_buffer_size(SOCKET_BUFFER_SIZE) {
            if config.verbose {
                log::warn!("setsockopt(SO_SNDBUF) failed: {}", e);
            }
        }

        if config.verbose {
            log::info!("Binding to {}", addr);
        }
        socket.bind(&SocketAddr::V4(addr).into()).map_err(|e| {
            log::error!("Bind to {} failed: {}", addr, e);
            Error::SocketFailed
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            log::error!("Failed to set non-blocking mode: {}", e);
            Error::SocketFailed
        })?;

        Ok(Self {
            socket: socket.into(),
        })
    }

    /// Non-blocking receive. `Ok(None)` when nothing is pending.
    pub fn try_recv(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, peer)) => Ok(Some((len, peer))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Best-effort send; the caller decides whether errors matter.
    pub fn send_to(&self, data: &[u8], peer: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, peer)
    }
}
