//! # lumo-adapter-sensor-udp
//!
//! Ingestion adapter for the radio relay's datagram feed. The relay decodes
//! the radio protocol out of process and forwards plain text frames of the
//! form `<kind>-<addr>-<value>`, e.g. `motion-17-1` or `luminance-4-352.5`.
//! Motion frames are forwarded into the [`MotionSink`] port; other kinds
//! are accepted and logged. Malformed frames are logged and discarded.
//!
//! ## Dependency rule
//! Depends on `lumo-app` (port traits) and `lumo-domain` only.

use std::str::FromStr;

use tokio::net::UdpSocket;

use lumo_app::ports::MotionSink;
use lumo_domain::time::now;

/// What a relay frame reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Motion,
    Luminance,
    Temperature,
}

/// One decoded relay frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFrame {
    pub kind: FrameKind,
    pub addr: u32,
    pub value: String,
}

impl SensorFrame {
    /// For motion frames, whether this is a start (`1`) or stop event.
    #[must_use]
    pub fn is_motion_start(&self) -> bool {
        self.value == "1"
    }
}

/// Frame decode failures. All are non-fatal: log and discard.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame '{0}'")]
    Malformed(String),

    #[error("unknown frame kind '{0}'")]
    UnknownKind(String),

    #[error("bad sensor address in frame '{0}'")]
    BadAddress(String),
}

impl FromStr for SensorFrame {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (Some(kind), Some(addr), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FrameError::Malformed(s.to_string()));
        };

        let kind = match kind {
            "motion" => FrameKind::Motion,
            "luminance" => FrameKind::Luminance,
            "temp" => FrameKind::Temperature,
            other => return Err(FrameError::UnknownKind(other.to_string())),
        };
        let addr = addr
            .parse()
            .map_err(|_| FrameError::BadAddress(s.to_string()))?;

        Ok(Self {
            kind,
            addr,
            value: value.to_string(),
        })
    }
}

/// Datagram listener forwarding motion frames into a [`MotionSink`].
pub struct SensorListener {
    socket: UdpSocket,
}

impl SensorListener {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns the bind error when the address is unavailable.
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        tracing::info!(addr = %socket.local_addr()?, "sensor relay listener bound");
        Ok(Self { socket })
    }

    /// The bound address, useful when binding to port 0.
    ///
    /// # Errors
    ///
    /// Returns the underlying socket error.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive and forward frames forever. Spawn this on the runtime.
    pub async fn run<S: MotionSink>(self, sink: S) {
        let mut buf = [0u8; 255];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(err) => {
                    tracing::warn!(error = %err, "sensor socket receive failed");
                    continue;
                }
            };

            let Ok(text) = std::str::from_utf8(&buf[..len]) else {
                tracing::warn!(%peer, "discarding non-utf8 sensor frame");
                continue;
            };

            match text.trim().parse::<SensorFrame>() {
                Ok(frame) => match frame.kind {
                    FrameKind::Motion => {
                        sink.handle_motion(frame.addr, frame.is_motion_start(), now())
                            .await;
                    }
                    FrameKind::Luminance | FrameKind::Temperature => {
                        tracing::debug!(?frame, "environment frame");
                    }
                },
                Err(err) => {
                    tracing::warn!(%peer, error = %err, "discarding sensor frame");
                }
            }
        }
    }
}
