//! DogStatsD reporting client.
//!
//! Datagram layout:
//! ```text
//! <NAME>:<VALUE>|<TYPE>[|@<SAMPLE_RATE>][|#<TAG1>,<TAG2>...]
//! ```
//! - `TYPE` is `c` for counts and `g` for gauges.
//! - `@rate` is written only when the rate is not 1.
//! - Tags are passed through verbatim, in order.
//!
//! Sends are fire-and-forget over a non-blocking UDP socket. A full socket
//! buffer drops the datagram with a warning instead of blocking the caller.

use std::fmt::Write;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use bytes::BytesMut;

use metricport_core::error::{MetricportError, Result};
use metricport_core::EmissionKind;

/// Where flattened sub-metrics are sent.
pub trait MetricSink: Send + Sync {
    fn count(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()>;
    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()>;

    fn emit(
        &self,
        kind: EmissionKind,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
    ) -> Result<()> {
        match kind {
            EmissionKind::Count => self.count(name, value, tags, rate),
            EmissionKind::Gauge => self.gauge(name, value, tags, rate),
        }
    }
}

/// Render one datagram into `buf` (cleared first).
pub fn format_datagram(
    buf: &mut BytesMut,
    name: &str,
    value: f64,
    kind: EmissionKind,
    tags: &[String],
    rate: f64,
) {
    buf.clear();
    let ty = match kind {
        EmissionKind::Count => "c",
        EmissionKind::Gauge => "g",
    };
    let _ = write!(buf, "{name}:{value}|{ty}");
    if rate != 1.0 {
        let _ = write!(buf, "|@{rate}");
    }
    if let Some((first, rest)) = tags.split_first() {
        let _ = write!(buf, "|#{first}");
        for t in rest {
            let _ = write!(buf, ",{t}");
        }
    }
}

/// UDP client for a DogStatsD agent.
#[derive(Debug)]
pub struct StatsdClient {
    socket: UdpSocket,
    agent_addr: SocketAddr,
}

impl StatsdClient {
    /// Resolve `address` (`host:port`) and bind an ephemeral local socket.
    pub fn connect(address: &str) -> Result<Self> {
        let invalid = |reason: String| MetricportError::InvalidAddress {
            addr: address.to_string(),
            reason,
        };

        let agent_addr = address
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("resolved to no addresses".into()))?;

        let bind_addr = if agent_addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind_addr).map_err(|e| invalid(format!("bind failed: {e}")))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| invalid(format!("set_nonblocking failed: {e}")))?;

        tracing::debug!(%agent_addr, "statsd client ready");
        Ok(Self { socket, agent_addr })
    }

    pub fn agent_addr(&self) -> SocketAddr {
        self.agent_addr
    }

    fn send(
        &self,
        kind: EmissionKind,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
    ) -> Result<()> {
        let mut buf = BytesMut::with_capacity(64 + name.len());
        format_datagram(&mut buf, name, value, kind, tags, rate);

        match self.socket.send_to(&buf, self.agent_addr) {
            Ok(_) => {
                tracing::trace!(metric = %name, %value, "sent");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tracing::warn!(metric = %name, error = %e, "dropped metric: send would block");
                Ok(())
            }
            Err(source) => Err(MetricportError::Send {
                metric: name.to_string(),
                source,
            }),
        }
    }
}

impl MetricSink for StatsdClient {
    fn count(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()> {
        self.send(EmissionKind::Count, name, value, tags, rate)
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> Result<()> {
        self.send(EmissionKind::Gauge, name, value, tags, rate)
    }
}

/// Stand-in used when the client could not be constructed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedSink;

impl MetricSink for DisconnectedSink {
    fn count(&self, _: &str, _: f64, _: &[String], _: f64) -> Result<()> {
        Err(MetricportError::NoClient)
    }

    fn gauge(&self, _: &str, _: f64, _: &[String], _: f64) -> Result<()> {
        Err(MetricportError::NoClient)
    }
}
