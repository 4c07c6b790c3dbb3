//! Plaintext datagram front end. Also speaks the replication control
//! protocol: a `ZONE_TRANSFER` datagram makes this server pull the named
//! zone from the given primary and answer `SUCCESS` or `FAILURE`.

use super::{parse_control_message, process_message};
use crate::authority::ZoneAuthority;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{error, info, warn};

pub struct UdpTransport {
    socket: UdpSocket,
    authority: Arc<ZoneAuthority>,
}

impl UdpTransport {
    pub async fn bind(listen: SocketAddr, authority: Arc<ZoneAuthority>) -> Result<Self> {
        let socket = UdpSocket::bind(listen).await?;
        info!(listen = %socket.local_addr()?, "UDP transport ready");
        Ok(Self { socket, authority })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve forever, one datagram at a time.
    pub async fn run(self) -> Result<()> {
        let mut buf = vec![0u8; 4096];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!(error = %e, "receive failed");
                    continue;
                }
            };

            self.handle_datagram(&buf[..len], peer).await;
        }
    }

    async fn handle_datagram(&self, data: &[u8], peer: SocketAddr) {
        if let Some((zone, primary)) = parse_control_message(data) {
            let verdict = match self.authority.pull_zone(&zone, primary).await {
                Ok(()) => {
                    info!(%zone, %primary, %peer, "zone transfer succeeded");
                    "SUCCESS"
                }
                Err(e) => {
                    warn!(%zone, %primary, %peer, error = %e, "zone transfer failed");
                    "FAILURE"
                }
            };
            if let Err(e) = self.socket.send_to(verdict.as_bytes(), peer).await {
                warn!(%peer, error = %e, "control reply failed");
            }
            return;
        }

        match process_message(&self.authority, data).await {
            Ok(reply) => {
                if let Err(e) = self.socket.send_to(&reply, peer).await {
                    warn!(%peer, error = %e, "reply failed");
                }
            }
            // Nothing to relay: the query was malformed or the upstream
            // never answered. The client sees silence.
            Err(e) => warn!(%peer, error = %e, "query dropped"),
        }
    }
}
