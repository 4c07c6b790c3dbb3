use std::fmt;

/// Zone-related errors
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneError {
    /// Zone file parsing error
    ParseError(String),
    /// Invalid record data
    InvalidRecord(String),
    /// Missing SOA record at the origin
    MissingSOA,
    /// More than one SOA record set in the zone
    DuplicateSOA,
    /// Origin has no NS record set
    MissingNS,
    /// A name in the zone is not under the origin
    NameOutOfZone(String),
    /// IO error
    IoError(String),
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError(msg) => write!(f, "Zone parse error: {}", msg),
            Self::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
            Self::MissingSOA => write!(f, "Zone missing required SOA record at origin"),
            Self::DuplicateSOA => write!(f, "Zone contains more than one SOA record set"),
            Self::MissingNS => write!(f, "Zone origin has no NS records"),
            Self::NameOutOfZone(name) => write!(f, "Name not under zone origin: {}", name),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ZoneError {}

pub type Result<T> = std::result::Result<T, ZoneError>;
