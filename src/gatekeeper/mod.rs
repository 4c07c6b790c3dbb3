//! The anti-DoS front door: admits or denies by source IP, splits admitted
//! queries across the primary/secondary authority pair, and keeps the pair
//! converged with periodic replication triggers.
//!
//! The gatekeeper never inspects zone data; it relays opaque replies.

pub mod admission;
pub mod dispatcher;

pub use admission::{AdmissionConfig, AdmissionControl, Decision};
pub use dispatcher::{Dispatcher, Route};

use crate::client;
use crate::dns::DNSPacket;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Reply sent to denied sources; a first-class outcome, not silence.
pub const BANNED_REPLY: &[u8] = b"IP banned";

/// Wire form of the replication control message.
pub fn zone_transfer_message(zone: &str, primary: SocketAddr) -> String {
    format!("ZONE_TRANSFER {} {} {}", zone, primary.ip(), primary.port())
}

/// Ask the secondary at `secondary` to pull `zone` from `primary`. Returns
/// whether the secondary reported SUCCESS.
pub async fn trigger_zone_transfer(
    secondary: SocketAddr,
    zone: &str,
    primary: SocketAddr,
) -> Result<bool> {
    let message = zone_transfer_message(zone, primary);
    let reply = client::exchange(secondary, message.as_bytes()).await?;
    Ok(reply == b"SUCCESS")
}

/// Gatekeeper runtime configuration.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub listen: SocketAddr,
    pub primary: SocketAddr,
    pub secondary: SocketAddr,
    pub admission: AdmissionConfig,
    /// Zone replicated by the periodic trigger
    pub zone_name: String,
    /// How often the secondary is told to re-pull from the primary
    pub replication_interval: Duration,
}

/// The gatekeeper server: one receive loop plus two periodic background
/// tasks sharing the admission maps.
pub struct Gatekeeper {
    socket: UdpSocket,
    admission: Arc<AdmissionControl>,
    dispatcher: Dispatcher,
    config: GatekeeperConfig,
}

impl Gatekeeper {
    pub async fn bind(config: GatekeeperConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.listen).await?;
        info!(
            listen = %socket.local_addr()?,
            primary = %config.primary,
            secondary = %config.secondary,
            threshold = config.admission.threshold,
            "gatekeeper ready"
        );
        Ok(Self {
            socket,
            admission: Arc::new(AdmissionControl::new(config.admission.clone())),
            dispatcher: Dispatcher::new(config.primary, config.secondary),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn admission(&self) -> Arc<AdmissionControl> {
        self.admission.clone()
    }

    /// Run the receive loop and both background loops until the process
    /// exits. Each datagram is admitted, routed, relayed, and answered
    /// before the next one is read.
    pub async fn run(self) -> Result<()> {
        let admission = self.admission.clone();
        let amnesty_period = self.config.admission.window;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(amnesty_period);
            tick.tick().await; // immediate first tick
            loop {
                tick.tick().await;
                admission.reset_history();
                debug!("rate-limit amnesty");
            }
        });

        let zone = self.config.zone_name.clone();
        let primary = self.config.primary;
        let secondary = self.config.secondary;
        let replication_interval = self.config.replication_interval;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(replication_interval);
            tick.tick().await;
            loop {
                tick.tick().await;
                info!(%zone, "triggering periodic zone transfer");
                match trigger_zone_transfer(secondary, &zone, primary).await {
                    Ok(true) => info!(%zone, "replication succeeded"),
                    Ok(false) => warn!(%zone, "secondary reported replication failure"),
                    Err(e) => warn!(%zone, error = %e, "replication trigger failed"),
                }
            }
        });

        let mut buf = vec![0u8; 4096];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!(error = %e, "receive failed");
                    continue;
                }
            };

            if let Err(e) = self.handle_datagram(&buf[..len], peer).await {
                warn!(%peer, error = %e, "dropping query");
            }
        }
    }

    async fn handle_datagram(&self, data: &[u8], peer: SocketAddr) -> Result<()> {
        if self.admission.admit(peer.ip()) == Decision::Deny {
            self.socket.send_to(BANNED_REPLY, peer).await?;
            return Ok(());
        }

        let query = DNSPacket::parse(data)?;
        let (upstream, route) = self.dispatcher.route(&query);
        debug!(%peer, ?route, id = query.header.id, "relaying query");

        // No retry against the other upstream: a failed relay is dropped.
        let reply = client::exchange(upstream, data).await?;

        self.socket.send_to(&reply, peer).await?;
        Ok(())
    }
}
