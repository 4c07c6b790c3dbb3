//! The gatekeeper binary: the anti-DoS front door for a primary/secondary
//! authority pair.

use bastion_dns::Result;
use bastion_dns::config::GatekeeperFileConfig;
use bastion_dns::gatekeeper::{AdmissionConfig, Gatekeeper, GatekeeperConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bastion-gatekeeper", about = "DNS admission control and load splitting")]
struct Args {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:31110")]
    listen: SocketAddr,

    /// Primary authority (also receives all updates)
    #[arg(long, default_value = "127.0.0.1:31111")]
    primary: SocketAddr,

    /// Secondary authority
    #[arg(long, default_value = "127.0.0.1:31112")]
    secondary: SocketAddr,

    /// Max queries allowed per source in one time window
    #[arg(long, default_value_t = 100)]
    threshold: u32,

    /// Time window in seconds
    #[arg(long, default_value_t = 5)]
    time_window: u64,

    /// Ban duration in seconds
    #[arg(long, default_value_t = 300)]
    ban_duration: u64,

    /// Zone replicated by the periodic trigger
    #[arg(long, default_value = "example.com")]
    zone_name: String,

    /// Seconds between replication triggers
    #[arg(long, default_value_t = 100)]
    replication_interval: u64,

    /// Read the whole configuration from a TOML file instead of flags
    #[arg(long, conflicts_with_all = ["listen", "primary", "secondary", "threshold", "time_window", "ban_duration", "zone_name", "replication_interval"])]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<GatekeeperConfig> {
        match self.config {
            Some(path) => Ok(GatekeeperFileConfig::from_file(&path)?.into()),
            None => Ok(GatekeeperConfig {
                listen: self.listen,
                primary: self.primary,
                secondary: self.secondary,
                admission: AdmissionConfig {
                    threshold: self.threshold,
                    window: Duration::from_secs(self.time_window),
                    ban_duration: Duration::from_secs(self.ban_duration),
                },
                zone_name: self.zone_name,
                replication_interval: Duration::from_secs(self.replication_interval),
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    Gatekeeper::bind(config).await?.run().await
}
