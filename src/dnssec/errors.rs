use std::fmt;

/// DNSSEC signing and validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum DnsSecError {
    /// No usable DNSKEY record set in a candidate zone
    MissingTrustAnchor,
    /// More than one DNSKEY record set in a candidate zone
    AmbiguousTrustAnchor,
    /// A record set has no covering signature
    NoRrsig(String),
    /// A signature record set covers no data
    UnmatchedRrsig(String),
    /// Signature expired
    SignatureExpired,
    /// Signature not yet valid
    SignatureNotYetValid,
    /// Algorithm not supported
    UnsupportedAlgorithm(u8),
    /// Signature verification failed
    SignatureInvalid,
    /// Invalid DNSKEY public key format
    InvalidPublicKey,
    /// Invalid RRSIG format
    InvalidSignature,
    /// Private key could not be loaded
    KeyLoad(String),
}

impl fmt::Display for DnsSecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTrustAnchor => write!(f, "No DNSKEY record set found for validation"),
            Self::AmbiguousTrustAnchor => {
                write!(f, "More than one DNSKEY record set in candidate zone")
            }
            Self::NoRrsig(name) => write!(f, "No covering RRSIG for record set at {}", name),
            Self::UnmatchedRrsig(name) => {
                write!(f, "RRSIG at {} covers no data record set", name)
            }
            Self::SignatureExpired => write!(f, "DNSSEC signature has expired"),
            Self::SignatureNotYetValid => write!(f, "DNSSEC signature is not yet valid"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "Unsupported DNSSEC algorithm: {}", alg),
            Self::SignatureInvalid => write!(f, "DNSSEC signature verification failed"),
            Self::InvalidPublicKey => write!(f, "Invalid DNSKEY public key format"),
            Self::InvalidSignature => write!(f, "Invalid RRSIG record format"),
            Self::KeyLoad(msg) => write!(f, "Cannot load signing key: {}", msg),
        }
    }
}

impl std::error::Error for DnsSecError {}

pub type Result<T> = std::result::Result<T, DnsSecError>;
