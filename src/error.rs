use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DnsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid DNS packet: {0}")]
    InvalidPacket(String),

    #[error("Invalid label length: {0}")]
    InvalidLabelLength(u8),

    #[error("DNS name too long")]
    NameTooLong,

    #[error("Zone error: {0}")]
    Zone(#[from] crate::zone::ZoneError),

    #[error("DNSSEC error: {0}")]
    DnsSec(#[from] crate::dnssec::DnsSecError),

    #[error("Update target {0} is outside the zone")]
    MalformedUpdateTarget(String),

    #[error("Upstream {0} failed: {1}")]
    UpstreamFailure(String, String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        DnsError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;
