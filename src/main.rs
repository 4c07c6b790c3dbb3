//! The authoritative server binary: one zone, one signing key, one
//! transport front end.

use bastion_dns::authority::ZoneAuthority;
use bastion_dns::config::{AuthorityConfig, TransportMode};
use bastion_dns::transport::{doh::DohTransport, dot::DotTransport, tls, udp::UdpTransport};
use bastion_dns::{DnsError, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bastiond", about = "Authoritative DNSSEC name server")]
struct Args {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:31111")]
    listen: SocketAddr,

    /// Transport front end
    #[arg(long, value_enum, default_value = "udp")]
    mode: TransportMode,

    /// Zone master file
    #[arg(long, default_value = "zones/primary.zone")]
    zone_file: PathBuf,

    /// PKCS#8 PEM private key for zone signing
    #[arg(long, default_value = "keys/primary.pem")]
    private_key_file: PathBuf,

    /// Upstream resolver for names not found locally
    #[arg(long, default_value = "1.1.1.1:53")]
    upstream: SocketAddr,

    /// TLS certificate chain (dot/doh modes)
    #[arg(long)]
    tls_cert_file: Option<PathBuf>,

    /// TLS private key (dot/doh modes)
    #[arg(long)]
    tls_key_file: Option<PathBuf>,

    /// Read the whole configuration from a TOML file instead of flags
    #[arg(long, conflicts_with_all = ["listen", "mode", "zone_file", "private_key_file", "upstream", "tls_cert_file", "tls_key_file"])]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<AuthorityConfig> {
        match self.config {
            Some(path) => AuthorityConfig::from_file(&path),
            None => Ok(AuthorityConfig {
                listen: self.listen,
                mode: self.mode,
                zone_file: self.zone_file,
                private_key_file: self.private_key_file,
                upstream: self.upstream,
                tls_cert_file: self.tls_cert_file,
                tls_key_file: self.tls_key_file,
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

    let authority = Arc::new(ZoneAuthority::load(
        config.zone_file.clone(),
        &config.private_key_file,
        config.upstream,
    )?);

    match config.mode {
        TransportMode::Udp => {
            UdpTransport::bind(config.listen, authority).await?.run().await
        }
        TransportMode::Dot => {
            let acceptor = tls_acceptor(&config)?;
            DotTransport::bind(config.listen, acceptor, authority)
                .await?
                .run()
                .await
        }
        TransportMode::Doh => {
            let acceptor = tls_acceptor(&config)?;
            DohTransport::bind(config.listen, acceptor, authority)
                .await?
                .run()
                .await
        }
    }
}

fn tls_acceptor(config: &AuthorityConfig) -> Result<tokio_rustls::TlsAcceptor> {
    let cert = config
        .tls_cert_file
        .as_deref()
        .ok_or_else(|| DnsError::Config("dot/doh modes need --tls-cert-file".to_string()))?;
    let key = config
        .tls_key_file
        .as_deref()
        .ok_or_else(|| DnsError::Config("dot/doh modes need --tls-key-file".to_string()))?;
    tls::acceptor_from_pem(cert, key)
}
