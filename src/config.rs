use crate::error::{DnsError, Result};
use crate::gatekeeper::{AdmissionConfig, GatekeeperConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which front end the authority binary serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Udp,
    Dot,
    Doh,
}

/// Authority server configuration. Loadable from a TOML file; the CLI
/// builds the same struct from flags when no file is given.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorityConfig {
    pub listen: SocketAddr,
    pub mode: TransportMode,
    pub zone_file: PathBuf,
    pub private_key_file: PathBuf,
    /// The one upstream that not-found lookups are relayed to
    pub upstream: SocketAddr,
    /// Required for the dot/doh modes
    pub tls_cert_file: Option<PathBuf>,
    pub tls_key_file: Option<PathBuf>,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:31111".parse().expect("valid default listen"),
            mode: TransportMode::Udp,
            zone_file: PathBuf::from("zones/primary.zone"),
            private_key_file: PathBuf::from("keys/primary.pem"),
            upstream: "1.1.1.1:53".parse().expect("valid default upstream"),
            tls_cert_file: None,
            tls_key_file: None,
        }
    }
}

impl AuthorityConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }
}

/// Gatekeeper configuration as it appears in a TOML file; durations are
/// whole seconds, matching the CLI surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatekeeperFileConfig {
    pub listen: SocketAddr,
    pub primary: SocketAddr,
    pub secondary: SocketAddr,
    pub threshold: u32,
    pub time_window_secs: u64,
    pub ban_duration_secs: u64,
    pub zone_name: String,
    pub replication_interval_secs: u64,
}

impl Default for GatekeeperFileConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:31110".parse().expect("valid default listen"),
            primary: "127.0.0.1:31111".parse().expect("valid default primary"),
            secondary: "127.0.0.1:31112".parse().expect("valid default secondary"),
            threshold: 100,
            time_window_secs: 5,
            ban_duration_secs: 300,
            zone_name: "example.com".to_string(),
            replication_interval_secs: 100,
        }
    }
}

impl GatekeeperFileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }
}

impl From<GatekeeperFileConfig> for GatekeeperConfig {
    fn from(file: GatekeeperFileConfig) -> Self {
        GatekeeperConfig {
            listen: file.listen,
            primary: file.primary,
            secondary: file.secondary,
            admission: AdmissionConfig {
                threshold: file.threshold,
                window: Duration::from_secs(file.time_window_secs),
                ban_duration: Duration::from_secs(file.ban_duration_secs),
            },
            zone_name: file.zone_name,
            replication_interval: Duration::from_secs(file.replication_interval_secs),
        }
    }
}

fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DnsError::Config(format!("{}: {}", path.display(), e)))?;
    toml::from_str(&text).map_err(|e| DnsError::Config(format!("{}: {}", path.display(), e)))
}
